use std::time::Duration;

/// Outcome of one admission gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl AdmissionDecision {
    pub fn allow() -> Self {
        AdmissionDecision { allowed: true, reason: None }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        AdmissionDecision { allowed: false, reason: Some(reason.into()) }
    }
}

/// Result of recording one hit against a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window closes.
    pub resets_in: Duration,
}

impl RateDecision {
    /// Whole seconds a rejected client should wait, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.resets_in.as_secs();
        let secs = if self.resets_in.subsec_nanos() > 0 { secs + 1 } else { secs };
        secs.max(1)
    }
}

impl From<&RateDecision> for AdmissionDecision {
    fn from(decision: &RateDecision) -> Self {
        if decision.allowed {
            AdmissionDecision::allow()
        } else {
            AdmissionDecision::reject(format!(
                "rate limit of {} requests exceeded, window resets in {}s",
                decision.limit,
                decision.retry_after_secs()
            ))
        }
    }
}

/// Requests without an `Origin` header come from non-browser clients and pass.
/// Otherwise the origin must equal one allow-list entry exactly.
pub fn check_origin(origin: Option<&str>, allowed_origins: &[String]) -> AdmissionDecision {
    match origin {
        None => AdmissionDecision::allow(),
        Some(origin) if allowed_origins.iter().any(|allowed| allowed == origin) => {
            AdmissionDecision::allow()
        }
        Some(origin) => AdmissionDecision::reject(format!("origin {origin} is not allow-listed")),
    }
}
