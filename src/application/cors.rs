use std::str::FromStr;

use bunner_cors_rs::{
    AllowedHeaders, AllowedMethods, Cors, CorsOptions, Origin, OriginDecision, ValidationError,
};

pub const WILDCARD: &str = "*";
pub const DEV_CLIENT_ORIGIN: &str = "http://localhost:3001";

/// Ordered, de-duplicated list of origins allowed to make credentialed
/// cross-origin calls. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for candidate in candidates {
            let trimmed = candidate.as_ref().trim().trim_end_matches('/');
            if trimmed.is_empty() {
                continue;
            }
            if !out.iter().any(|o| o == trimmed) {
                out.push(trimmed.to_string());
            }
        }
        Self(out)
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.0.iter().any(|o| o.eq_ignore_ascii_case(origin))
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// What to answer when the request origin is not on the allow-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OriginFallback {
    /// Answer with the first allowed origin (or `*`).
    #[default]
    Strict,
    /// Echo whatever origin the caller sent. Development only.
    Mirror,
}

impl FromStr for OriginFallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "strict" => Ok(Self::Strict),
            "mirror" => Ok(Self::Mirror),
            other => anyhow::bail!("unknown CORS origin fallback `{other}` (expected strict or mirror)"),
        }
    }
}

pub const ALLOW_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "OPTIONS"];
pub const ALLOW_HEADERS: [&str; 2] = ["Content-Type", "Authorization"];
pub const MAX_AGE_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: AllowedOrigins,
    fallback: OriginFallback,
}

impl CorsPolicy {
    pub fn new(origins: AllowedOrigins, fallback: OriginFallback) -> Self {
        Self { origins, fallback }
    }

    pub fn default_origin(&self) -> &str {
        self.origins.first().unwrap_or(WILDCARD)
    }

    /// Picks the `Access-Control-Allow-Origin` value for a request.
    pub fn resolve_origin<'a>(&'a self, origin: Option<&'a str>) -> &'a str {
        match origin {
            None => self.default_origin(),
            Some(o) if self.origins.contains(o) => o,
            Some(o) => match self.fallback {
                OriginFallback::Strict => {
                    tracing::debug!(origin = %o, "cors_origin_rejected");
                    self.default_origin()
                }
                OriginFallback::Mirror => o,
            },
        }
    }

    /// Echoed origins mirror the caller's own spelling; anything else is a
    /// fixed value.
    fn decide(&self, origin: Option<&str>) -> OriginDecision {
        let resolved = self.resolve_origin(origin);
        match origin {
            Some(o) if o == resolved => OriginDecision::mirror(),
            _ => OriginDecision::exact(resolved),
        }
    }

    /// Builds the CORS engine with `resolve_origin` as its origin callback.
    pub fn into_cors(self) -> Result<Cors, ValidationError> {
        Cors::new(CorsOptions {
            origin: Origin::custom(move |origin, _| self.decide(origin)),
            methods: AllowedMethods::list(ALLOW_METHODS),
            allowed_headers: AllowedHeaders::list(ALLOW_HEADERS),
            credentials: true,
            max_age: Some(MAX_AGE_SECS),
            // "null" goes through the fallback like any other unlisted origin.
            allow_null_origin: true,
            ..CorsOptions::default()
        })
    }
}
