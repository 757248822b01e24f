use chrono::{Days, NaiveDate};

/// Fixed loan period applied to every issuance.
pub const LOAN_PERIOD_DAYS: u64 = 14;

/// Late fee per whole day, in currency minor units.
pub const FINE_PER_DAY: i64 = 100;

pub fn due_date(date_borrowed: NaiveDate) -> NaiveDate {
    date_borrowed + Days::new(LOAN_PERIOD_DAYS)
}

/// Fine owed for a return on `actual_return_date`. Returning on the due
/// date itself is on time; only full days past it are charged.
pub fn calculate_fine(due_date: NaiveDate, actual_return_date: NaiveDate) -> i64 {
    if actual_return_date <= due_date {
        return 0;
    }
    (actual_return_date - due_date).num_days() * FINE_PER_DAY
}
