//! OpenAPI document for the public endpoints.

use crate::handlers::{catalog, crud, gallery};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "hospital-records", description = "Hospital records REST API"),
    paths(
        crud::list,
        crud::read,
        crud::create,
        crud::update,
        crud::remove,
        gallery::index,
        gallery::run,
        catalog::list,
        catalog::browse,
    ),
    tags((name = "hospital", description = "CRUD, consultas y catálogo"))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_public_path() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for p in [
            "/api/crud/{tabla}",
            "/api/crud/{tabla}/{id}",
            "/api/consultas",
            "/api/consultas/{nombre}",
            "/api/tablas",
            "/api/tablas/{tabla}",
        ] {
            assert!(paths.contains(&p), "missing {}", p);
        }
    }
}
