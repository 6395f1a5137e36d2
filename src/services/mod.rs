/// Round-scoped team eligibility.
pub mod allocator;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match administration: scheduling, editing and listings.
pub mod match_service;
/// Live scoring and status changes.
pub mod scoring_service;
/// Operator session stream.
pub mod sse_service;
/// Storage connection supervision and degraded mode.
pub mod storage_supervisor;
