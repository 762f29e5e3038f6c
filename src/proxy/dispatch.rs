/// Fallback route suffix for queue endpoints addressed without one.
pub const DEFAULT_RUNPOD_ROUTE: &str = "run";

/// Routing outcome for an inbound inference request, decided by the first
/// non-empty path segment against the closed provider table. Exact-match and
/// case-sensitive; everything else is `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// `/fal/<rest>`: forwarded to the fal API with the prefix stripped.
    Fal { rest: String },
    /// `/runpod/<endpointId>[/<route...>]`: forwarded to the runpod queue API.
    Runpod { endpoint_id: String, route: String },
    /// The first segment names no known provider.
    NotFound,
}

impl RouteDecision {
    /// Total over every path; no I/O, no panics. Unknown segments never
    /// forward traffic.
    pub fn resolve(path: &str) -> Self {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match segments.next() {
            Some("fal") => RouteDecision::Fal {
                rest: segments.collect::<Vec<_>>().join("/"),
            },
            Some("runpod") => {
                let endpoint_id = segments.next().unwrap_or_default().to_string();
                let route = segments.collect::<Vec<_>>().join("/");
                RouteDecision::Runpod {
                    endpoint_id,
                    route: if route.is_empty() {
                        DEFAULT_RUNPOD_ROUTE.to_string()
                    } else {
                        route
                    },
                }
            }
            _ => RouteDecision::NotFound,
        }
    }
}
