use crate::routes::convert::ConvertApi;
use crate::routes::health::HealthApi;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "docx2pdf-server",
    description = "Upload a .docx document, receive a PDF",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(HealthApi::openapi());
    root.merge(ConvertApi::openapi());
    root
}
