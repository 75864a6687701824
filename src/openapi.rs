use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::index,
        crate::features::health::handler::health_check,
        crate::features::avatar::handler::generate,
        crate::features::avatar::handler::generate_variants,
        crate::features::avatar::handler::bulk_generate,
        crate::features::avatar::handler::serve_image,
        crate::features::avatar::handler::serve_image_base64,
        crate::features::avatar::handler::list_colors,
        crate::features::stats::handler::get_stats,
    ),
    components(
        schemas(
            crate::error::AppError,
            crate::error::ProblemDetails,
            crate::features::avatar::Variant,
            crate::features::avatar::types::GenerateRequest,
            crate::features::avatar::types::GenerateVariantsRequest,
            crate::features::avatar::types::BulkGenerateRequest,
            crate::features::avatar::types::UserInfo,
            crate::features::avatar::types::GenerateResponse,
            crate::features::avatar::types::GenerateVariantsResponse,
            crate::features::avatar::types::BulkItemResult,
            crate::features::avatar::types::BulkGenerateResponse,
            crate::features::avatar::types::ImageBase64Response,
            crate::features::avatar::types::ColorsResponse,
            crate::features::stats::models::GroupCount,
            crate::features::stats::models::StatsSnapshot,
            crate::features::stats::models::StatsResponse,
            crate::features::health::handler::HealthResponse,
            crate::features::health::handler::ServiceDescriptor,
        )
    ),
    tags(
        (name = "Avatar", description = "Initials avatar APIs"),
        (name = "Stats", description = "Stats APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "Initials Avatar API",
        version = "0.1.0",
        description = "Placeholder profile image generator (Axum)"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/",
            "/health",
            "/generate",
            "/generate-variants",
            "/bulk-generate",
            "/image/{initials}/{filename}",
            "/image-base64/{initials}/{filename}",
            "/colors",
            "/stats",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
