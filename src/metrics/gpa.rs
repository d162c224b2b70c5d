use serde::Serialize;

use crate::metrics::Snapshot;
use crate::metrics::stats::{assignment_percentage, course_stats};
use crate::models::Assignment;

pub const RECENT_GRADES_LIMIT: usize = 8;

/// Ordered from the top; the first band whose lower bound is met wins.
///
/// | percentage >= | letter | points |
/// |---------------|--------|--------|
/// | 97            | A+     | 4.0    |
/// | 93            | A      | 3.7    |
/// | 90            | A-     | 3.3    |
/// | 87            | B+     | 3.0    |
/// | 83            | B      | 2.7    |
/// | 80            | B-     | 2.3    |
/// | 77            | C+     | 2.0    |
/// | 73            | C      | 1.7    |
/// | 70            | C-     | 1.3    |
/// | 67            | D+     | 1.0    |
/// | 65            | D      | 0.7    |
/// | below 65      | F      | 0.0    |
///
/// Points are stored in tenths so weighted sums stay exact.
const GRADE_BANDS: [(f64, &str, u32); 11] = [
    (97.0, "A+", 40),
    (93.0, "A", 37),
    (90.0, "A-", 33),
    (87.0, "B+", 30),
    (83.0, "B", 27),
    (80.0, "B-", 23),
    (77.0, "C+", 20),
    (73.0, "C", 17),
    (70.0, "C-", 13),
    (67.0, "D+", 10),
    (65.0, "D", 7),
];

fn band(percentage: f64) -> Option<(&'static str, u32)> {
    GRADE_BANDS
        .iter()
        .find(|(floor, _, _)| percentage >= *floor)
        .map(|(_, letter, tenths)| (*letter, *tenths))
}

fn gpa_tenths(percentage: f64) -> u32 {
    band(percentage).map(|(_, tenths)| tenths).unwrap_or(0)
}

pub fn letter_grade(percentage: f64) -> &'static str {
    band(percentage).map(|(letter, _)| letter).unwrap_or("F")
}

pub fn gpa_point(percentage: f64) -> f64 {
    f64::from(gpa_tenths(percentage)) / 10.0
}

/// Credit-weighted mean of course grade points. Courses without any graded
/// work are left out; `None` when no course qualifies.
///
/// Sums are taken over integer tenths and divided once, so a single
/// included course yields exactly its own grade point.
pub fn overall_gpa(snapshot: &Snapshot) -> Option<f64> {
    let mut weighted_tenths: u64 = 0;
    let mut credits: u64 = 0;

    for course in snapshot.courses() {
        let Some(percentage) = course_stats(snapshot, course.id).average_percentage else {
            continue;
        };
        let course_credits = u64::from(course.credits);
        weighted_tenths += u64::from(gpa_tenths(percentage)) * course_credits;
        credits += course_credits;
    }

    if credits == 0 {
        return None;
    }
    Some(weighted_tenths as f64 / (10 * credits) as f64)
}

/// Graded assignments, newest record first, capped at
/// [`RECENT_GRADES_LIMIT`]. Equal creation times keep snapshot order.
pub fn recent_grades(snapshot: &Snapshot) -> Vec<&Assignment> {
    let mut graded: Vec<&Assignment> = snapshot
        .assignments()
        .iter()
        .filter(|a| assignment_percentage(a).is_some())
        .collect();
    graded.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    graded.truncate(RECENT_GRADES_LIMIT);
    graded
}

/// Colour band the UI uses for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStanding {
    Excellent,
    Good,
    Fair,
    AtRisk,
}

impl GradeStanding {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            GradeStanding::Excellent
        } else if percentage >= 80.0 {
            GradeStanding::Good
        } else if percentage >= 70.0 {
            GradeStanding::Fair
        } else {
            GradeStanding::AtRisk
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub count: usize,
    /// Share of all graded assignments, 0 to 100.
    pub share: f64,
}

/// Letter-family counts over individual graded assignments. This is an
/// assignment-level statistic and does not go through course aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeDistribution {
    pub graded: usize,
    pub a: DistributionBucket,
    pub b: DistributionBucket,
    pub c: DistributionBucket,
    pub d_f: DistributionBucket,
}

pub fn grade_distribution(snapshot: &Snapshot) -> GradeDistribution {
    let mut counts = [0usize; 4];
    let mut graded = 0;

    for percentage in snapshot.assignments().iter().filter_map(assignment_percentage) {
        graded += 1;
        let slot = match letter_grade(percentage).as_bytes()[0] {
            b'A' => 0,
            b'B' => 1,
            b'C' => 2,
            _ => 3,
        };
        counts[slot] += 1;
    }

    let bucket = |count: usize| DistributionBucket {
        count,
        share: if graded == 0 {
            0.0
        } else {
            100.0 * count as f64 / graded as f64
        },
    };

    GradeDistribution {
        graded,
        a: bucket(counts[0]),
        b: bucket(counts[1]),
        c: bucket(counts[2]),
        d_f: bucket(counts[3]),
    }
}
