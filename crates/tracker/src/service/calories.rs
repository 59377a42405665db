use std::sync::Arc;

use chrono::NaiveDate;
use eyre::Result;
use model::{
    calories::{CalorieDay, CalorieQuery, CalorieRange, Paged},
    decimal::Decimal,
    input::ensure_positive,
    session::Session,
    statistics::{average_over_range, CalorieAverages},
};
use mongodb::bson::oid::ObjectId;
use storage::calories::CalorieStore;

#[derive(Clone)]
pub struct Calories {
    store: Arc<CalorieStore>,
}

impl Calories {
    pub(crate) fn new(store: Arc<CalorieStore>) -> Self {
        Calories { store }
    }

    /// Adds calories to the running total of `date`.
    pub async fn add(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
        calories: Decimal,
    ) -> Result<()> {
        let calories = ensure_positive(calories)?;
        self.store.add(session, user_id, date, calories).await
    }

    pub async fn get(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
    ) -> Result<Option<CalorieDay>> {
        self.store.get(session, user_id, date).await
    }

    pub async fn delete_day(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
    ) -> Result<u64> {
        self.store.delete_day(session, user_id, date).await
    }

    /// One page of days. Page count is taken over all days of the user.
    pub async fn list(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        query: CalorieQuery,
    ) -> Result<Paged<CalorieDay>> {
        let total = self.store.count(session, user_id).await?;
        let entries = self.store.page(session, user_id, &query).await?;
        Ok(Paged {
            entries,
            page: query.page.number(),
            total_pages: query.page.total_pages(total),
        })
    }

    /// All days in the range, oldest first.
    pub async fn days(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        range: CalorieRange,
    ) -> Result<Vec<CalorieDay>> {
        self.store.range(session, user_id, range).await
    }

    pub async fn average_over_range(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        let days = self
            .store
            .range(session, user_id, CalorieRange::Between(start, end))
            .await?;
        Ok(average_over_range(&days, start, end))
    }

    /// Averages for the month and the year containing `today`, and over
    /// every recorded day.
    pub async fn averages(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        today: NaiveDate,
    ) -> Result<CalorieAverages> {
        let days = self.store.range(session, user_id, CalorieRange::All).await?;
        Ok(averages(&days, today))
    }
}

pub(crate) fn averages(days: &[CalorieDay], today: NaiveDate) -> CalorieAverages {
    let month = dates::current_month(today)
        .map(|(start, end)| average_over_range(days, start, end))
        .unwrap_or_default();
    let year = dates::current_year(today)
        .map(|(start, end)| average_over_range(days, start, end))
        .unwrap_or_default();
    CalorieAverages {
        month,
        year,
        all_time: Decimal::average(days.iter().map(|day| day.total_calories)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(date: NaiveDate, calories: i64) -> CalorieDay {
        CalorieDay {
            id: ObjectId::new(),
            user_id: ObjectId::new(),
            date,
            total_calories: Decimal::int(calories),
        }
    }

    #[test]
    fn test_averages() {
        let days = [
            day(date(2023, 12, 31), 3000),
            day(date(2024, 1, 10), 1000),
            day(date(2024, 2, 1), 2000),
            day(date(2024, 2, 29), 2500),
        ];
        let averages = averages(&days, date(2024, 2, 15));
        assert_eq!("2250.00", averages.month.to_string());
        assert_eq!("1833.33", averages.year.to_string());
        assert_eq!("2125.00", averages.all_time.to_string());
    }

    #[test]
    fn test_averages_without_days() {
        assert_eq!(CalorieAverages::default(), averages(&[], date(2024, 2, 15)));
    }
}
