//! AWS session context — explicit immutable value, no ambient globals.

/// Credential and region context for every `aws` CLI invocation.
///
/// Built once from CLI flags (or `AWS_PROFILE` / `AWS_REGION`), then shared
/// by reference across all concurrent dispatch tasks. Read-only after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Named profile from `~/.aws/config`, if any.
    pub profile: Option<String>,
    /// Region override, if any.
    pub region: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(profile: Option<String>, region: Option<String>) -> Self {
        Self { profile, region }
    }

    /// Global `aws` CLI arguments for this session.
    #[must_use]
    pub fn cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args
    }
}
