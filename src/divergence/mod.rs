//! Shadow-mode comparison of legacy and policy-engine access decisions.
//!
//! Enforcement always happens elsewhere. This module re-runs the legacy
//! decision for the same request and category, compares it to the policy
//! engine's answer, and emits exactly one structured warning per mismatch.
//! It never changes control flow: any failure while building or emitting
//! a record is swallowed.
//!
//! Cutover for a category is safe once [`DivergenceLogger::mismatch_count`]
//! stays at zero over a soak period.

pub mod legacy;
mod record;

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::atomic::{AtomicU64, Ordering},
};

pub use record::{DivergenceRecord, IdentitySnapshot, RequestMeta, SessionSnapshot};
use serde_json::{Map, Value};

use crate::{
    identity::{RequestContext, ResolvedIdentity, SessionRecord},
    policy::{self, CheckCategory, LegalStatus},
};

/// Log target for divergence records, for routing in log aggregation.
pub const DIVERGENCE_TARGET: &str = "gatekeeper::divergence";

/// Outcome of running two independent decision functions over one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub legacy_allowed: bool,
    pub policy_allowed: bool,
}

impl Comparison {
    pub fn diverges(&self) -> bool {
        self.legacy_allowed != self.policy_allowed
    }
}

/// Run a legacy and a policy decision function over identical input.
pub fn compare<I: ?Sized>(
    input: &I,
    legacy: impl FnOnce(&I) -> bool,
    policy: impl FnOnce(&I) -> bool,
) -> Comparison {
    Comparison {
        legacy_allowed: legacy(input),
        policy_allowed: policy(input),
    }
}

/// Observability tap that records legacy/policy disagreements.
pub struct DivergenceLogger {
    enabled: bool,
    mismatches: [AtomicU64; CheckCategory::COUNT],
}

impl DivergenceLogger {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            mismatches: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Compare a precomputed legacy decision with the policy decision.
    ///
    /// Returns whether a divergence was recorded.
    pub fn log(
        &self,
        category: CheckCategory,
        meta: &RequestMeta,
        comparison: Comparison,
        identity: Option<&ResolvedIdentity>,
        session: Option<&SessionRecord>,
    ) -> bool {
        self.log_with_context(category, meta, comparison, identity, session, Map::new())
    }

    /// Like [`log`](Self::log), with extra context attached to the record.
    ///
    /// For call sites whose legacy check does not fit the generic session
    /// check, e.g. the NDA gate passes `{has_nda, has_contract}`.
    pub fn log_with_context(
        &self,
        category: CheckCategory,
        meta: &RequestMeta,
        comparison: Comparison,
        identity: Option<&ResolvedIdentity>,
        session: Option<&SessionRecord>,
        context: Map<String, Value>,
    ) -> bool {
        if !self.enabled || !comparison.diverges() {
            return false;
        }

        catch_unwind(AssertUnwindSafe(|| {
            let record = DivergenceRecord::new(category, meta, comparison, identity, session)
                .with_context(context);
            self.emit(&record);
            true
        }))
        .unwrap_or(false)
    }

    /// Recompute both decisions for a category and log any disagreement.
    pub fn shadow_check(
        &self,
        category: CheckCategory,
        meta: &RequestMeta,
        ctx: &RequestContext,
        identity: Option<&ResolvedIdentity>,
        legal: Option<&LegalStatus>,
    ) -> bool {
        if !self.enabled {
            return false;
        }

        let comparison = compare(
            ctx,
            |ctx| legacy::evaluate(category, ctx, legal),
            |_| policy::evaluate(category, identity, legal),
        );
        self.log(category, meta, comparison, identity, ctx.session.as_ref())
    }

    /// Divergences recorded for a category since this logger was created.
    pub fn mismatch_count(&self, category: CheckCategory) -> u64 {
        self.mismatches[category.index()].load(Ordering::Relaxed)
    }

    pub fn total_mismatches(&self) -> u64 {
        self.mismatches
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    fn emit(&self, record: &DivergenceRecord) {
        let payload = serde_json::to_string(record).unwrap_or_default();

        tracing::warn!(
            target: DIVERGENCE_TARGET,
            category = record.category.as_str(),
            path = %record.path,
            method = %record.method,
            legacy_allowed = record.legacy_allowed,
            policy_allowed = record.policy_allowed,
            identity.kind = record.identity.kind.map(|k| k.as_str()),
            identity.role = record.identity.role.as_deref(),
            identity.mfa_verified = record.identity.mfa_verified,
            identity.mfa_pending = record.identity.mfa_pending,
            session.user_id_present = record.session.user_id_present,
            session.role = record.session.role.as_deref(),
            session.mfa_pending = record.session.mfa_pending,
            session.mfa_verified = record.session.mfa_verified,
            record = %payload,
            "Authorization divergence between legacy check and policy engine"
        );

        self.mismatches[record.category.index()].fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for DivergenceLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use serde_json::json;
    use tracing::{
        Event, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{
        Layer,
        layer::{Context, SubscriberExt},
    };

    use super::*;
    use crate::identity::{InternalPrincipal, SessionRecord, VerifiedClaims, resolve};

    fn meta() -> RequestMeta {
        RequestMeta::new("GET", "/admin/leads")
    }

    #[test]
    fn test_compare_runs_both_functions() {
        let c = compare(&3, |n| *n > 2, |n| *n > 5);
        assert_eq!(
            c,
            Comparison {
                legacy_allowed: true,
                policy_allowed: false
            }
        );
        assert!(c.diverges());
    }

    #[test]
    fn test_agreement_emits_nothing() {
        let logger = DivergenceLogger::new(true);
        for allowed in [true, false] {
            let recorded = logger.log(
                CheckCategory::Admin,
                &meta(),
                Comparison {
                    legacy_allowed: allowed,
                    policy_allowed: allowed,
                },
                None,
                None,
            );
            assert!(!recorded);
        }
        assert_eq!(logger.total_mismatches(), 0);
    }

    #[test]
    fn test_mismatch_is_recorded_once_per_call() {
        let logger = DivergenceLogger::new(true);
        let recorded = logger.log(
            CheckCategory::Admin,
            &meta(),
            Comparison {
                legacy_allowed: true,
                policy_allowed: false,
            },
            None,
            None,
        );
        assert!(recorded);
        assert_eq!(logger.mismatch_count(CheckCategory::Admin), 1);
        assert_eq!(logger.mismatch_count(CheckCategory::Affiliate), 0);
        assert_eq!(logger.total_mismatches(), 1);
    }

    #[test]
    fn test_disabled_logger_records_nothing() {
        let logger = DivergenceLogger::new(false);
        let recorded = logger.log(
            CheckCategory::Claims,
            &meta(),
            Comparison {
                legacy_allowed: false,
                policy_allowed: true,
            },
            None,
            None,
        );
        assert!(!recorded);
        assert_eq!(logger.total_mismatches(), 0);
    }

    #[test]
    fn test_partial_snapshots_do_not_panic() {
        let logger = DivergenceLogger::new(true);
        let session = SessionRecord {
            user_role: Some("admin".into()),
            ..Default::default()
        };
        let recorded = logger.log(
            CheckCategory::Authenticated,
            &RequestMeta::new("", ""),
            Comparison {
                legacy_allowed: false,
                policy_allowed: true,
            },
            None,
            Some(&session),
        );
        assert!(recorded);
    }

    #[test]
    fn test_shadow_check_detects_verified_pending_drift() {
        // Legacy code only looked at mfaPending, so (pending, verified) =
        // (true, true) is denied there but allowed by the policy engine.
        let logger = DivergenceLogger::new(true);
        let ctx = RequestContext::new()
            .with_session(SessionRecord::for_user(5, "admin").with_mfa(true, true));
        let identity = resolve(&ctx);

        assert!(logger.shadow_check(
            CheckCategory::Admin,
            &meta(),
            &ctx,
            identity.as_ref(),
            None
        ));
    }

    #[test]
    fn test_shadow_check_agrees_for_plain_session_admin() {
        let logger = DivergenceLogger::new(true);
        let ctx = RequestContext::new()
            .with_session(SessionRecord::for_user(5, "admin").with_mfa(false, false));
        let identity = resolve(&ctx);

        for category in [
            CheckCategory::Authenticated,
            CheckCategory::Admin,
            CheckCategory::Affiliate,
            CheckCategory::Claims,
            CheckCategory::MfaRequired,
        ] {
            assert!(
                !logger.shadow_check(category, &meta(), &ctx, identity.as_ref(), None),
                "{category} should agree"
            );
        }
    }

    #[test]
    fn test_shadow_check_flags_internal_principal() {
        let logger = DivergenceLogger::new(true);
        let ctx = RequestContext::new().with_internal(InternalPrincipal::service(1, "master"));
        let identity = resolve(&ctx);

        assert!(logger.shadow_check(
            CheckCategory::Admin,
            &meta(),
            &ctx,
            identity.as_ref(),
            None
        ));
        assert_eq!(logger.mismatch_count(CheckCategory::Admin), 1);
    }

    #[test]
    fn test_claims_agree_for_veteran() {
        let logger = DivergenceLogger::new(true);
        let ctx = RequestContext::new().with_claims(VerifiedClaims::with_sub("v"));
        let identity = resolve(&ctx);
        assert!(!logger.shadow_check(
            CheckCategory::Claims,
            &meta(),
            &ctx,
            identity.as_ref(),
            None
        ));
    }

    /// One captured event: target, level and fields rendered as strings.
    #[derive(Debug, Clone)]
    struct CapturedEvent {
        target: String,
        level: tracing::Level,
        fields: HashMap<String, String>,
    }

    #[derive(Default)]
    struct FieldVisitor(HashMap<String, String>);

    impl Visit for FieldVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{:?}", value));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.0.insert(field.name().to_string(), value.to_string());
        }
    }

    #[derive(Clone, Default)]
    struct CaptureLayer(Arc<Mutex<Vec<CapturedEvent>>>);

    impl<S: Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = FieldVisitor::default();
            event.record(&mut visitor);
            if let Ok(mut events) = self.0.lock() {
                events.push(CapturedEvent {
                    target: event.metadata().target().to_string(),
                    level: *event.metadata().level(),
                    fields: visitor.0,
                });
            }
        }
    }

    /// Run `f` with a subscriber that records every event emitted on this thread.
    fn capture_events(f: impl FnOnce()) -> Vec<CapturedEvent> {
        let layer = CaptureLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, f);
        let events = layer.0.lock().unwrap().clone();
        events
            .into_iter()
            .filter(|e| e.target == DIVERGENCE_TARGET)
            .collect()
    }

    #[test]
    fn test_mismatch_emits_one_structured_warning() {
        let logger = DivergenceLogger::new(true);
        let session = SessionRecord::for_user(5, "affiliate").with_mfa(false, false);
        let identity = resolve(&RequestContext::new().with_session(session.clone()));
        let mut context = Map::new();
        context.insert("has_nda".into(), json!(true));
        context.insert("has_contract".into(), json!(false));

        let events = capture_events(|| {
            logger.log_with_context(
                CheckCategory::AffiliateNda,
                &RequestMeta::new("GET", "/affiliate/leads"),
                Comparison {
                    legacy_allowed: true,
                    policy_allowed: false,
                },
                identity.as_ref(),
                Some(&session),
                context,
            );
        });

        assert_eq!(events.len(), 1, "{events:?}");
        let event = &events[0];
        assert_eq!(event.level, tracing::Level::WARN);

        let fields = &event.fields;
        assert_eq!(fields["category"], "affiliate_nda");
        assert_eq!(fields["path"], "/affiliate/leads");
        assert_eq!(fields["method"], "GET");
        assert_eq!(fields["legacy_allowed"], "true");
        assert_eq!(fields["policy_allowed"], "false");
        assert_eq!(fields["identity.kind"], "user");
        assert_eq!(fields["identity.role"], "affiliate");
        assert_eq!(fields["identity.mfa_verified"], "false");
        assert_eq!(fields["identity.mfa_pending"], "false");
        assert_eq!(fields["session.user_id_present"], "true");
        assert_eq!(fields["session.role"], "affiliate");
        assert_eq!(fields["session.mfa_pending"], "false");
        assert_eq!(fields["session.mfa_verified"], "false");

        let record: Value = serde_json::from_str(&fields["record"]).unwrap();
        assert_eq!(record["category"], "affiliate_nda");
        assert_eq!(record["legacyAllowed"], true);
        assert_eq!(record["policyAllowed"], false);
        assert_eq!(record["identity"]["kind"], "user");
        assert_eq!(record["session"]["userIdPresent"], true);
        assert_eq!(record["context"]["has_nda"], true);
        assert_eq!(record["context"]["has_contract"], false);
    }

    #[test]
    fn test_agreement_and_disabled_logger_emit_no_events() {
        let enabled = DivergenceLogger::new(true);
        let disabled = DivergenceLogger::new(false);

        let events = capture_events(|| {
            enabled.log(
                CheckCategory::Admin,
                &meta(),
                Comparison {
                    legacy_allowed: true,
                    policy_allowed: true,
                },
                None,
                None,
            );
            disabled.log(
                CheckCategory::Admin,
                &meta(),
                Comparison {
                    legacy_allowed: true,
                    policy_allowed: false,
                },
                None,
                None,
            );
        });

        assert!(events.is_empty(), "{events:?}");
    }

    #[test]
    fn test_context_map_is_accepted() {
        let logger = DivergenceLogger::new(true);
        let mut context = Map::new();
        context.insert("has_nda".into(), json!(true));
        context.insert("has_contract".into(), json!(false));

        assert!(logger.log_with_context(
            CheckCategory::AffiliateNda,
            &meta(),
            Comparison {
                legacy_allowed: true,
                policy_allowed: false,
            },
            None,
            None,
            context,
        ));
        assert_eq!(logger.mismatch_count(CheckCategory::AffiliateNda), 1);
    }
}
