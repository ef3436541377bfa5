//! Response body of `GET /health`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: &'static str,
    /// Identity provider guarding the admin API.
    pub auth: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ComponentCheck,
    pub view_queue: ComponentCheck,
    pub cache: ComponentCheck,
}

impl HealthChecks {
    pub fn status(&self) -> ServiceStatus {
        let all_ok = [&self.database, &self.view_queue, &self.cache]
            .iter()
            .all(|c| c.status == CheckState::Ok);
        if all_ok {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Degraded
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: CheckState,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ComponentCheck {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: CheckState::Ok,
            detail: detail.into(),
            latency_ms: None,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: CheckState::Error,
            detail: detail.into(),
            latency_ms: None,
        }
    }

    pub fn timed(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_failed_check_degrades() {
        let checks = HealthChecks {
            database: ComponentCheck::ok("up"),
            view_queue: ComponentCheck::ok("open"),
            cache: ComponentCheck::error("down"),
        };
        assert_eq!(checks.status(), ServiceStatus::Degraded);
    }

    #[test]
    fn test_serialized_shape() {
        let check = ComponentCheck::ok("up").timed(3);
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["latency_ms"], 3);
        assert!(serde_json::to_value(ComponentCheck::error("x")).unwrap()["latency_ms"].is_null());
    }
}
