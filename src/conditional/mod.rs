//! Origin-side conditional rendering.
//!
//! An origin handler describes its caching intent with [`RenderOptions`],
//! asks [`evaluate`] whether the client's copy is still current, and then
//! either renders a body or answers `304 Not Modified`:
//!
//! ```
//! use rttp_cache::conditional::{RenderOptions, evaluate};
//! use rttp_cache::http::{Response, StatusCode};
//! use rttp_cache::validation::ConditionalRequest;
//!
//! let options = RenderOptions::builder().public().etag("1").build().unwrap();
//! let evaluation = evaluate(&options, &ConditionalRequest::default());
//! let response = evaluation.respond(|| Response::new(StatusCode::Ok).body("fresh"));
//!
//! assert_eq!(response.status(), StatusCode::Ok);
//! assert_eq!(response.cache_control(), Some("public"));
//! assert!(response.headers().contains("etag"));
//! ```
//!
//! Private responses always render: the shared cache never answers for a
//! single client, so a validator match is not honoured for them.

use std::time::SystemTime;

use crate::freshness::{FreshnessPolicy, PolicyError, Visibility, build_policy};
use crate::http::{Response, date, names};
use crate::validation::{ConditionalRequest, ValidatorKind, Validators, matches};

/// Whether the origin must produce a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDecision {
    /// Produce a full response.
    Render,
    /// The client's copy is current; answer 304 with no body.
    Skip,
}

/// Decides between rendering and skipping the body.
pub fn should_render_body(
    visibility: Visibility,
    validators: &Validators,
    incoming: &ConditionalRequest,
) -> RenderDecision {
    match visibility {
        Visibility::Private => RenderDecision::Render,
        Visibility::Public if matches(validators, incoming) => RenderDecision::Skip,
        Visibility::Public => RenderDecision::Render,
    }
}

/// A validated description of how one response may be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    policy: FreshnessPolicy,
    cache_control: String,
    validator: ValidatorKind,
}

impl RenderOptions {
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder::default()
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    pub fn validator(&self) -> &ValidatorKind {
        &self.validator
    }
}

/// Builder for [`RenderOptions`]. Visibility defaults to public.
#[derive(Debug, Clone)]
pub struct RenderOptionsBuilder {
    public: bool,
    private: bool,
    max_age: Option<i64>,
    validator: ValidatorKind,
    must_revalidate: bool,
}

impl Default for RenderOptionsBuilder {
    fn default() -> Self {
        Self {
            public: false,
            private: false,
            max_age: None,
            validator: ValidatorKind::None,
            must_revalidate: false,
        }
    }
}

impl RenderOptionsBuilder {
    #[must_use]
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Sets public or private from a single flag.
    #[must_use]
    pub fn visibility(self, visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => self.public(),
            Visibility::Private => self.private(),
        }
    }

    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Validates with an entity tag derived from `key`.
    #[must_use]
    pub fn etag(mut self, key: impl Into<String>) -> Self {
        self.validator = ValidatorKind::ETag(key.into());
        self
    }

    /// Validates with a modification time.
    #[must_use]
    pub fn last_modified(mut self, time: SystemTime) -> Self {
        self.validator = ValidatorKind::LastModified(time);
        self
    }

    #[must_use]
    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// # Errors
    ///
    /// - [`PolicyError::ConflictingVisibility`] when both public and private were requested.
    /// - [`PolicyError::NegativeMaxAge`] for a negative max-age.
    /// - [`PolicyError::LastModifiedOutOfRange`] for a modification time
    ///   before the Unix epoch or after year 9999.
    pub fn build(self) -> Result<RenderOptions, PolicyError> {
        if self.public && self.private {
            return Err(PolicyError::ConflictingVisibility);
        }
        if let ValidatorKind::LastModified(time) = self.validator {
            if !date::is_representable(time) {
                return Err(PolicyError::LastModifiedOutOfRange);
            }
        }
        let visibility = if self.private {
            Visibility::Private
        } else {
            Visibility::Public
        };
        let (policy, cache_control) =
            build_policy(visibility, self.max_age, self.must_revalidate)?;
        Ok(RenderOptions {
            policy,
            cache_control,
            validator: self.validator,
        })
    }
}

/// The outcome of checking a request against [`RenderOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: RenderDecision,
    pub policy: FreshnessPolicy,
    pub cache_control: String,
    pub validators: Validators,
}

/// Recomputes validators from `options` and compares them with `incoming`.
pub fn evaluate(options: &RenderOptions, incoming: &ConditionalRequest) -> Evaluation {
    let validators = options.validator.to_validators();
    let decision = should_render_body(options.policy.visibility, &validators, incoming);
    Evaluation {
        decision,
        policy: options.policy,
        cache_control: options.cache_control.clone(),
        validators,
    }
}

impl Evaluation {
    /// Returns `true` when the origin has to render a body.
    pub fn is_stale(&self) -> bool {
        self.decision == RenderDecision::Render
    }

    /// Attaches `Cache-Control` and the validators to a rendered response.
    pub fn decorate(&self, mut response: Response) -> Response {
        response.set_header(names::CACHE_CONTROL, self.cache_control.as_str());
        self.validators.apply(response.headers_mut());
        response
    }

    /// Builds the bodiless 304 answer, carrying the current validators and
    /// freshness header.
    pub fn not_modified(&self) -> Response {
        self.decorate(Response::not_modified())
    }

    /// Calls `render` only when the body is needed.
    pub fn respond(&self, render: impl FnOnce() -> Response) -> Response {
        match self.decision {
            RenderDecision::Render => self.decorate(render()),
            RenderDecision::Skip => self.not_modified(),
        }
    }
}

/// Marks a response as reusable for `max_age` seconds without attaching
/// validators.
///
/// # Errors
///
/// [`PolicyError::NegativeMaxAge`] for a negative `max_age`.
pub fn expires_in(
    mut response: Response,
    visibility: Visibility,
    max_age: i64,
    must_revalidate: bool,
) -> Result<Response, PolicyError> {
    let (_, header) = build_policy(visibility, Some(max_age), must_revalidate)?;
    response.set_header(names::CACHE_CONTROL, header);
    Ok(response)
}
