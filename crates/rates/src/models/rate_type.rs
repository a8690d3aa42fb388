use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

/// Family or source of exchange-rate quotations.
///
/// Open-ended: the well-known constants cover the usual regimes, and
/// applications may define their own with [`RateType::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateType(Cow<'static, str>);

impl RateType {
    /// Matches any regime; used by callers that do not care.
    pub const ANY: RateType = RateType(Cow::Borrowed("ANY"));
    /// Rates published with a delay (end-of-day fixings and similar).
    pub const DEFERRED: RateType = RateType(Cow::Borrowed("DEFERRED"));
    /// Historic time series (the IMF feed).
    pub const HISTORIC: RateType = RateType(Cow::Borrowed("HISTORIC"));
    /// Live market quotes.
    pub const REALTIME: RateType = RateType(Cow::Borrowed("REALTIME"));
    /// Anything else, including the identity provider.
    pub const OTHER: RateType = RateType(Cow::Borrowed("OTHER"));

    pub fn new(name: impl Into<String>) -> Self {
        RateType(Cow::Owned(name.into().to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RateType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
