//! Paths of the job service HTTP API.
//!
//! Path-segment parameters (`id0`, job key) are appended verbatim; both
//! are plain tokens on the wire.

pub const SUBMIT_JOB: &str = "/api/submit_mii_job";
pub const CHECK_JOB_STATUS: &str = "/api/check_job_status";
pub const CANCEL_JOB: &str = "/api/cancel_job";
pub const RESET_JOB: &str = "/api/admin/reset_job";
pub const LIST_JOBS: &str = "/api/admin/list_jobs";
pub const LIST_MINERS: &str = "/api/admin/list_miners";
pub const LIST_FRIENDBOTS: &str = "/api/admin/list_friendbots";
pub const NETWORK_STATS: &str = "/api/check_network_stats";
pub const DOWNLOAD_MOVABLE: &str = "/download_movable";

/// Join a base URL and an endpoint path without doubling the slash.
pub fn url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Join a base URL, an endpoint path and one trailing path segment.
pub fn url_with_segment(base: &str, path: &str, segment: &str) -> String {
    format!("{}/{}", url(base, path), segment)
}

/// Link to the finished result of a job. Never fetched by the client.
pub fn download_url(base: &str, id0: &str) -> String {
    url_with_segment(base, DOWNLOAD_MOVABLE, id0)
}
