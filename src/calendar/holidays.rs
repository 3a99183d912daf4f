//! Portuguese national holidays as pure functions of the year.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

/// Easter Sunday for a given year (Meeus/Jones/Butcher computus).
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .expect("computus always yields a valid March/April date")
}

/// All Portuguese national holidays of a year: the fixed dates plus the
/// four Easter-relative ones (Carnival, Good Friday, Easter Monday,
/// Corpus Christi).
pub fn portuguese_holidays(year: i32) -> BTreeSet<NaiveDate> {
    let fixed = [
        (1, 1),   // Ano Novo
        (4, 25),  // Dia da Liberdade
        (5, 1),   // Dia do Trabalhador
        (6, 10),  // Dia de Portugal
        (6, 13),  // Santo António
        (8, 15),  // Assunção de Nossa Senhora
        (10, 5),  // Implantação da República
        (11, 1),  // Dia de Todos os Santos
        (12, 1),  // Restauração da Independência
        (12, 8),  // Imaculada Conceição
        (12, 25), // Natal
    ];

    let mut holidays: BTreeSet<NaiveDate> = fixed
        .iter()
        .map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d).expect("fixed holiday date"))
        .collect();

    let easter = easter_sunday(year);
    holidays.insert(easter - Duration::days(47)); // Carnaval
    holidays.insert(easter - Duration::days(2)); // Sexta-feira Santa
    holidays.insert(easter + Duration::days(1)); // Segunda-feira de Páscoa
    holidays.insert(easter + Duration::days(60)); // Corpo de Deus

    holidays
}

/// Holiday lookup over a range of years.
///
/// The set is computed once at construction and never changes; lookups
/// are pure.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Calendar covering the inclusive year range.
    pub fn for_years(first: i32, last: i32) -> Self {
        let mut holidays = BTreeSet::new();
        for year in first..=last {
            holidays.extend(portuguese_holidays(year));
        }
        Self { holidays }
    }

    /// Calendar covering every year that appears in `dates`.
    pub fn covering(dates: &[NaiveDate]) -> Self {
        use chrono::Datelike;
        match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => Self::for_years(first.year(), last.year()),
            _ => Self::default(),
        }
    }

    /// Whether the date is a national holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// All holiday dates in the calendar.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_known_years() {
        assert_eq!(easter_sunday(2021), date(2021, 4, 4));
        assert_eq!(easter_sunday(2022), date(2022, 4, 17));
        assert_eq!(easter_sunday(2024), date(2024, 3, 31));
        assert_eq!(easter_sunday(2025), date(2025, 4, 20));
    }

    #[test]
    fn fixed_holidays_present() {
        let holidays = portuguese_holidays(2022);
        assert!(holidays.contains(&date(2022, 1, 1)));
        assert!(holidays.contains(&date(2022, 4, 25)));
        assert!(holidays.contains(&date(2022, 6, 10)));
        assert!(holidays.contains(&date(2022, 12, 25)));
    }

    #[test]
    fn easter_relative_holidays() {
        // Easter 2022 is April 17.
        let holidays = portuguese_holidays(2022);
        assert!(holidays.contains(&date(2022, 3, 1))); // Carnaval (-47)
        assert!(holidays.contains(&date(2022, 4, 15))); // Sexta-feira Santa (-2)
        assert!(holidays.contains(&date(2022, 4, 18))); // Segunda de Páscoa (+1)
        assert!(holidays.contains(&date(2022, 6, 16))); // Corpo de Deus (+60)
    }

    #[test]
    fn holiday_count_per_year() {
        // 11 fixed plus 4 movable; none coincide in these years.
        assert_eq!(portuguese_holidays(2021).len(), 15);
        assert_eq!(portuguese_holidays(2022).len(), 15);
    }

    #[test]
    fn calendar_covers_year_range() {
        let calendar = HolidayCalendar::for_years(2021, 2022);
        assert!(calendar.is_holiday(date(2021, 12, 25)));
        assert!(calendar.is_holiday(date(2022, 12, 25)));
        assert!(!calendar.is_holiday(date(2022, 7, 14)));
    }

    #[test]
    fn calendar_covering_dates() {
        let dates = vec![date(2021, 8, 1), date(2022, 7, 31)];
        let calendar = HolidayCalendar::covering(&dates);
        assert!(calendar.is_holiday(date(2021, 10, 5)));
        assert!(calendar.is_holiday(date(2022, 4, 15)));

        let empty = HolidayCalendar::covering(&[]);
        assert!(!empty.is_holiday(date(2022, 1, 1)));
    }

    #[test]
    fn computation_is_referentially_transparent() {
        assert_eq!(portuguese_holidays(2023), portuguese_holidays(2023));
    }
}
