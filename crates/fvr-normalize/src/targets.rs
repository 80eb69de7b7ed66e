//! Forecast target vocabulary and target-date rules.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Horizon encoded in a target name such as `"3 wk ahead cum death"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Days(u32),
    Weeks(u32),
}

impl Horizon {
    /// Parse the `"<N> day ahead ..."` / `"<N> wk ahead ..."` prefix.
    pub fn parse(target: &str) -> Option<Self> {
        let mut parts = target.split_whitespace();
        let n: u32 = parts.next()?.parse().ok()?;
        let unit = parts.next()?;
        if parts.next()? != "ahead" {
            return None;
        }
        match unit {
            "day" => Some(Horizon::Days(n)),
            "wk" => Some(Horizon::Weeks(n)),
            _ => None,
        }
    }

    /// Expected `target_end_date` for a forecast made on `forecast_date`.
    ///
    /// Week-ahead targets end on an epidemiological week Saturday: a forecast
    /// made on Sunday or Monday counts the Saturday of the same week as week 1;
    /// any later weekday pushes week 1 to the following Saturday.
    pub fn expected_end_date(&self, forecast_date: NaiveDate) -> NaiveDate {
        match *self {
            Horizon::Days(n) => forecast_date + Duration::days(i64::from(n)),
            Horizon::Weeks(n) => {
                let to_saturday = match forecast_date.weekday() {
                    Weekday::Sun => 6,
                    Weekday::Mon => 5,
                    other => 12 - i64::from(other.num_days_from_monday()),
                };
                let week1 = forecast_date + Duration::days(to_saturday);
                week1 + Duration::weeks(i64::from(n.saturating_sub(1)))
            }
        }
    }
}

/// Set of accepted target names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet {
    names: BTreeSet<String>,
}

impl TargetSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// COVID-19 forecast hub targets.
    pub fn covid19() -> Self {
        let mut names = Vec::new();
        for n in 0..=130 {
            names.push(format!("{n} day ahead inc hosp"));
            names.push(format!("{n} day ahead inc death"));
            names.push(format!("{n} day ahead cum death"));
        }
        for n in 1..=20 {
            names.push(format!("{n} wk ahead inc death"));
            names.push(format!("{n} wk ahead cum death"));
        }
        for n in 1..=8 {
            names.push(format!("{n} wk ahead inc case"));
        }
        Self::new(names)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.names.contains(target)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TargetSet {
    fn default() -> Self {
        Self::covid19()
    }
}
