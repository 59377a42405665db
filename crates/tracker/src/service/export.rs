use std::{path::Path, sync::Arc};

use chrono::NaiveDate;
use eyre::{Context as _, Result};
use log::info;
use model::{
    calories::{CalorieDay, CalorieRange, FoodItem},
    input::format_date,
    session::Session,
    settings::{ExportSettings, SortOrder},
    statistics::CalorieAverages,
    tip::{TipFilter, TipRecord},
};
use mongodb::bson::oid::ObjectId;
use storage::settings::SettingsStore;

use super::{calories::Calories, food_items::FoodItems, tips::Tips};

#[derive(Clone)]
pub struct Export {
    tips: Tips,
    calories: Calories,
    food_items: FoodItems,
    settings: Arc<SettingsStore>,
}

impl Export {
    pub(crate) fn new(
        tips: Tips,
        calories: Calories,
        food_items: FoodItems,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Export {
            tips,
            calories,
            food_items,
            settings,
        }
    }

    pub async fn calories(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        range: CalorieRange,
    ) -> Result<Option<String>> {
        let days = self.calories.days(session, user_id, range).await?;
        calories_csv(&days)
    }

    pub async fn averages(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        today: NaiveDate,
    ) -> Result<String> {
        let averages = self.calories.averages(session, user_id, today).await?;
        averages_csv(&averages)
    }

    pub async fn food_items(&self, session: &mut Session, user_id: ObjectId) -> Result<Option<String>> {
        let items = self.food_items.all(session, user_id).await?;
        food_items_csv(&items)
    }

    /// Notes and location columns follow the stored export settings.
    pub async fn tips(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        filter: &TipFilter,
    ) -> Result<Option<String>> {
        let settings = self.settings.get(session).await?;
        let tips = self
            .tips
            .list(session, user_id, filter, SortOrder::Ascending)
            .await?;
        tips_csv(&tips, &settings.export)
    }

    /// Writes the tips export to `path`. `false` when there was nothing to
    /// export and no file was written.
    pub async fn write_tips(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        filter: &TipFilter,
        path: &Path,
    ) -> Result<bool> {
        match self.tips(session, user_id, filter).await? {
            Some(csv) => {
                write(path, &csv).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn write_calories(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        range: CalorieRange,
        path: &Path,
    ) -> Result<bool> {
        match self.calories(session, user_id, range).await? {
            Some(csv) => {
                write(path, &csv).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

async fn write(path: &Path, csv: &str) -> Result<()> {
    tokio::fs::write(path, csv)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Exported {}", path.display());
    Ok(())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().context("Failed to flush csv")?;
    Ok(String::from_utf8(bytes)?)
}

pub fn calories_csv(days: &[CalorieDay]) -> Result<Option<String>> {
    if days.is_empty() {
        return Ok(None);
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Date", "Calories"])?;
    for day in days {
        writer.write_record([format_date(day.date), day.total_calories.to_string()])?;
    }
    finish(writer).map(Some)
}

pub fn averages_csv(averages: &CalorieAverages) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Period", "Average Calories"])?;
    writer.write_record(["Current Month", &averages.month.to_string()])?;
    writer.write_record(["Current Year", &averages.year.to_string()])?;
    writer.write_record(["All Time", &averages.all_time.to_string()])?;
    finish(writer)
}

pub fn food_items_csv(items: &[FoodItem]) -> Result<Option<String>> {
    if items.is_empty() {
        return Ok(None);
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Food Item", "Calories per 100g"])?;
    for item in items {
        writer.write_record([item.name.clone(), item.calories.to_string()])?;
    }
    finish(writer).map(Some)
}

pub fn tips_csv(tips: &[TipRecord], settings: &ExportSettings) -> Result<Option<String>> {
    if tips.is_empty() {
        return Ok(None);
    }
    let mut header = vec!["Date", "Amount", "Currency"];
    if settings.include_notes {
        header.push("Notes");
    }
    if settings.include_location {
        header.push("Location");
    }
    header.extend(["Base Amount", "Base Currency"]);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for tip in tips {
        let mut row = vec![
            format_date(tip.date),
            tip.amount.to_string(),
            tip.currency.to_string(),
        ];
        if settings.include_notes {
            row.push(tip.notes.clone());
        }
        if settings.include_location {
            row.push(tip.location.clone());
        }
        row.push(tip.base_amount.map(|amount| amount.to_string()).unwrap_or_default());
        row.push(tip.base_currency.to_string());
        writer.write_record(&row)?;
    }
    finish(writer).map(Some)
}
