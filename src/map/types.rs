use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Term {
    Fall,
    Winter,
    Spring,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::Fall, Term::Winter, Term::Spring];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fall" | "autumn" => Some(Self::Fall),
            "winter" => Some(Self::Winter),
            "spring" => Some(Self::Spring),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Winter => "winter",
            Self::Spring => "spring",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subject {
    Reading,
    LanguageUsage,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Subject::Reading, Subject::LanguageUsage];

    /// Accepts the wire key as well as the labels assessment exports use.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "reading" => Some(Self::Reading),
            "languageusage" | "language" => Some(Self::LanguageUsage),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::LanguageUsage => "languageUsage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::LanguageUsage => "Language Usage",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// School grade, kindergarten (0) through 12.
///
/// Any grade in range can be represented; whether norms exist for it is a
/// question for the norm table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
    pub const MAX: u8 = 12;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        u8::try_from(value).ok().and_then(Self::new)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Grade::new(value).ok_or_else(|| format!("grade must be in 0..={}", Grade::MAX))
    }
}

impl From<Grade> for u8 {
    fn from(g: Grade) -> u8 {
        g.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            f.write_str("K")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Pair of testing occasions within one academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthPeriod {
    FallToWinter,
    FallToSpring,
    WinterToSpring,
}

impl GrowthPeriod {
    pub const ALL: [GrowthPeriod; 3] = [
        GrowthPeriod::FallToWinter,
        GrowthPeriod::FallToSpring,
        GrowthPeriod::WinterToSpring,
    ];

    pub fn between(start: Term, end: Term) -> Option<Self> {
        match (start, end) {
            (Term::Fall, Term::Winter) => Some(Self::FallToWinter),
            (Term::Fall, Term::Spring) => Some(Self::FallToSpring),
            (Term::Winter, Term::Spring) => Some(Self::WinterToSpring),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "falltowinter" | "fall-winter" => Some(Self::FallToWinter),
            "falltospring" | "fall-spring" => Some(Self::FallToSpring),
            "wintertospring" | "winter-spring" => Some(Self::WinterToSpring),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FallToWinter => "fallToWinter",
            Self::FallToSpring => "fallToSpring",
            Self::WinterToSpring => "winterToSpring",
        }
    }

    pub fn start(self) -> Term {
        match self {
            Self::FallToWinter | Self::FallToSpring => Term::Fall,
            Self::WinterToSpring => Term::Winter,
        }
    }

    pub fn end(self) -> Term {
        match self {
            Self::FallToWinter => Term::Winter,
            Self::FallToSpring | Self::WinterToSpring => Term::Spring,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_parse_accepts_export_labels() {
        assert_eq!(Subject::parse("Language Usage"), Some(Subject::LanguageUsage));
        assert_eq!(Subject::parse("languageUsage"), Some(Subject::LanguageUsage));
        assert_eq!(Subject::parse("READING"), Some(Subject::Reading));
        assert_eq!(Subject::parse("Mathematics"), None);
    }

    #[test]
    fn grade_rejects_out_of_range() {
        assert!(Grade::new(12).is_some());
        assert!(Grade::new(13).is_none());
        assert!(Grade::from_i64(-1).is_none());
        assert_eq!(Grade::new(0).map(|g| g.to_string()), Some("K".to_string()));
    }

    #[test]
    fn growth_period_only_moves_forward() {
        assert_eq!(
            GrowthPeriod::between(Term::Fall, Term::Spring),
            Some(GrowthPeriod::FallToSpring)
        );
        assert_eq!(GrowthPeriod::between(Term::Spring, Term::Fall), None);
        assert_eq!(GrowthPeriod::between(Term::Winter, Term::Winter), None);
        for p in GrowthPeriod::ALL {
            assert!(p.start() < p.end());
            assert_eq!(GrowthPeriod::parse(p.as_str()), Some(p));
        }
    }
}
