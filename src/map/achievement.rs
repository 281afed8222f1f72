use super::norms::NormRegistry;
use super::types::{Grade, Subject, Term};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AchievementStatus {
    Low,
    BelowGradeLevel,
    AtGradeLevel,
    AboveGradeLevel,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

impl AchievementStatus {
    pub fn info(self) -> StatusInfo {
        match self {
            Self::High => StatusInfo {
                label: "High",
                description: "15 or more points above the grade-level norm",
                color: "#2563eb",
            },
            Self::AboveGradeLevel => StatusInfo {
                label: "Above Grade Level",
                description: "5 to 15 points above the grade-level norm",
                color: "#16a34a",
            },
            Self::AtGradeLevel => StatusInfo {
                label: "At Grade Level",
                description: "Within 5 points of the grade-level norm",
                color: "#65a30d",
            },
            Self::BelowGradeLevel => StatusInfo {
                label: "Below Grade Level",
                description: "5 to 15 points below the grade-level norm",
                color: "#d97706",
            },
            Self::Low => StatusInfo {
                label: "Low",
                description: "More than 15 points below the grade-level norm",
                color: "#dc2626",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectedStatus {
    NeedsIntervention,
    OnTrack,
    Exceeding,
}

impl ProjectedStatus {
    pub fn info(self) -> StatusInfo {
        match self {
            Self::Exceeding => StatusInfo {
                label: "Exceeding",
                description: "Projected 10 or more points above the spring norm",
                color: "#2563eb",
            },
            Self::OnTrack => StatusInfo {
                label: "On Track",
                description: "Projected to meet the spring norm",
                color: "#16a34a",
            },
            Self::NeedsIntervention => StatusInfo {
                label: "Needs Intervention",
                description: "Projected below the spring norm",
                color: "#dc2626",
            },
        }
    }
}

/// Lower bounds are inclusive; NaN falls through to `Low`.
pub fn get_achievement_status(score: f64, norm: f64) -> AchievementStatus {
    let diff = score - norm;
    if diff >= 15.0 {
        AchievementStatus::High
    } else if diff >= 5.0 {
        AchievementStatus::AboveGradeLevel
    } else if diff >= -5.0 {
        AchievementStatus::AtGradeLevel
    } else if diff >= -15.0 {
        AchievementStatus::BelowGradeLevel
    } else {
        AchievementStatus::Low
    }
}

pub fn get_projected_status(projected_score: f64, spring_norm: f64) -> ProjectedStatus {
    let diff = projected_score - spring_norm;
    if diff >= 10.0 {
        ProjectedStatus::Exceeding
    } else if diff >= 0.0 {
        ProjectedStatus::OnTrack
    } else {
        ProjectedStatus::NeedsIntervention
    }
}

/// Classifies against the grade/term/subject mean; `None` without a norm.
pub fn achievement_for(
    registry: &NormRegistry,
    score: f64,
    grade: Grade,
    term: Term,
    subject: Subject,
    academic_year: Option<&str>,
) -> Option<AchievementStatus> {
    if !score.is_finite() {
        return None;
    }
    let norm = registry.lookup(academic_year, grade, term, subject).ok()?;
    Some(get_achievement_status(score, norm.mean))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringProjection {
    pub projected_score: f64,
    pub spring_norm: f64,
    pub status: ProjectedStatus,
}

/// Typical-growth projection: the score plus the norm gain from `term` to spring.
pub fn project_spring(
    registry: &NormRegistry,
    score: f64,
    grade: Grade,
    term: Term,
    subject: Subject,
    academic_year: Option<&str>,
) -> Option<SpringProjection> {
    if !score.is_finite() {
        return None;
    }
    let current = registry.lookup(academic_year, grade, term, subject).ok()?;
    let spring = registry
        .lookup(academic_year, grade, Term::Spring, subject)
        .ok()?;
    let projected_score = score + (spring.mean - current.mean);
    Some(SpringProjection {
        projected_score,
        spring_norm: spring.mean,
        status: get_projected_status(projected_score, spring.mean),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn achievement_boundaries_close_on_the_lower_side() {
        assert_eq!(get_achievement_status(215.0, 200.0), AchievementStatus::High);
        assert_eq!(
            get_achievement_status(214.9, 200.0),
            AchievementStatus::AboveGradeLevel
        );
        assert_eq!(
            get_achievement_status(205.0, 200.0),
            AchievementStatus::AboveGradeLevel
        );
        assert_eq!(get_achievement_status(195.0, 200.0), AchievementStatus::AtGradeLevel);
        assert_eq!(
            get_achievement_status(194.9, 200.0),
            AchievementStatus::BelowGradeLevel
        );
        assert_eq!(
            get_achievement_status(185.0, 200.0),
            AchievementStatus::BelowGradeLevel
        );
        assert_eq!(get_achievement_status(184.9, 200.0), AchievementStatus::Low);
    }

    #[test]
    fn projection_boundaries() {
        assert_eq!(get_projected_status(220.0, 210.0), ProjectedStatus::Exceeding);
        assert_eq!(get_projected_status(219.9, 210.0), ProjectedStatus::OnTrack);
        assert_eq!(get_projected_status(210.0, 210.0), ProjectedStatus::OnTrack);
        assert_eq!(
            get_projected_status(209.9, 210.0),
            ProjectedStatus::NeedsIntervention
        );
    }

    #[test]
    fn labels_are_distinct() {
        let labels: std::collections::HashSet<&str> = [
            AchievementStatus::Low,
            AchievementStatus::BelowGradeLevel,
            AchievementStatus::AtGradeLevel,
            AchievementStatus::AboveGradeLevel,
            AchievementStatus::High,
        ]
        .iter()
        .map(|s| s.info().label)
        .collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(ProjectedStatus::OnTrack.info().label, "On Track");
    }

    #[test]
    fn spring_projection_adds_typical_gain() {
        let reg = NormRegistry::builtin();
        let grade = Grade::new(5).expect("grade");
        let p = project_spring(&reg, 206.0, grade, Term::Fall, Subject::Reading, None)
            .expect("projection");
        assert!((p.projected_score - 212.5).abs() < 1e-9);
        assert_eq!(p.status, ProjectedStatus::OnTrack);

        let spring = project_spring(&reg, 200.0, grade, Term::Spring, Subject::Reading, None)
            .expect("projection");
        assert_eq!(spring.projected_score, 200.0);
        assert_eq!(spring.status, ProjectedStatus::NeedsIntervention);

        let grade_8 = Grade::new(8).expect("grade");
        let none = project_spring(&reg, 200.0, grade_8, Term::Fall, Subject::Reading, None);
        assert!(none.is_none());
    }

    #[test]
    fn achievement_for_uses_term_mean() {
        let reg = NormRegistry::builtin();
        let grade = Grade::new(3).expect("grade");
        let s = achievement_for(&reg, 186.6 + 20.0, grade, Term::Fall, Subject::Reading, None);
        assert_eq!(s, Some(AchievementStatus::High));
        let kindergarten = Grade::new(0).expect("grade");
        assert_eq!(
            achievement_for(&reg, 200.0, kindergarten, Term::Fall, Subject::Reading, None),
            None
        );
    }
}
