//! Store level behaviour against a live MongoDB replica set.
//! Set `MONGO_TEST_URL` to run; every test uses its own database.

use std::collections::BTreeMap;

use bson::{doc, oid::ObjectId, Document};
use chrono::{NaiveDate, Utc};
use exchange::RatesApi;
use model::{
    calories::{CalorieQuery, CalorieRange, Page, Upserted},
    currency::{CurrencyCode, ExchangeRates},
    decimal::Decimal,
    session::Session,
    settings::SortOrder,
    tip::{NewTip, TipFilter, TipUpdate},
};
use storage::{legacy, Storage};
use tracker::{
    service::{
        currency::RatesSource,
        users::{DeleteUserError, SignUpError},
    },
    Tracker,
};

async fn setup() -> Option<(Tracker, Session)> {
    let url = std::env::var("MONGO_TEST_URL").ok()?;
    let db_name = format!("tracker_test_{}", ObjectId::new().to_hex());
    let storage = Storage::new(&url, &db_name).await.unwrap();
    let api = RatesApi::new("http://127.0.0.1:9/latest").unwrap();
    let tracker = Tracker::new(storage, api);
    let mut session = tracker.db.start_session().await.unwrap();
    tracker.init(&mut session, &CurrencyCode::usd()).await.unwrap();
    tracker.currency.use_rates(rates());
    Some((tracker, session))
}

fn rates() -> ExchangeRates {
    let mut rates = BTreeMap::new();
    rates.insert("EUR".to_owned(), 0.5);
    rates.insert("GBP".to_owned(), 0.8);
    ExchangeRates::new(rates, Utc::now())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn code(code: &str) -> CurrencyCode {
    code.parse().unwrap()
}

fn tip(amount: i64, currency: &str, day: NaiveDate, notes: &str, location: &str) -> NewTip {
    NewTip {
        amount: Decimal::int(amount),
        currency: code(currency),
        date: day,
        notes: notes.to_owned(),
        location: location.to_owned(),
    }
}

#[tokio::test]
async fn test_tips_merge_on_same_day_and_currency() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let day = date(2024, 3, 1);

    let first = tracker
        .tips
        .add(&mut session, user, tip(10, "EUR", day, "lunch", ""))
        .await
        .unwrap();
    let second = tracker
        .tips
        .add(&mut session, user, tip(5, "EUR", day, "dinner", "Main St"))
        .await
        .unwrap();
    assert_eq!(first, second);
    tracker
        .tips
        .add(&mut session, user, tip(7, "GBP", day, "", ""))
        .await
        .unwrap();

    let tips = tracker
        .tips
        .list(&mut session, user, &TipFilter::default(), SortOrder::Descending)
        .await
        .unwrap();
    assert_eq!(2, tips.len());
    let eur = tips.iter().find(|tip| tip.currency == code("EUR")).unwrap();
    assert_eq!(Decimal::int(15), eur.amount);
    assert_eq!("lunch; dinner", eur.notes);
    assert_eq!("Main St", eur.location);
    assert_eq!(Some(Decimal::int(30)), eur.base_amount);

    let other_user = tracker
        .tips
        .list(&mut session, ObjectId::new(), &TipFilter::default(), SortOrder::Descending)
        .await
        .unwrap();
    assert!(other_user.is_empty());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_invalid_tip_is_not_written() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    assert!(tracker
        .tips
        .add(&mut session, user, tip(0, "EUR", date(2024, 3, 1), "", ""))
        .await
        .is_err());
    let tips = tracker
        .tips
        .list(&mut session, user, &TipFilter::default(), SortOrder::Descending)
        .await
        .unwrap();
    assert!(tips.is_empty());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_tip_update_and_delete() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let id = tracker
        .tips
        .add(&mut session, user, tip(10, "EUR", date(2024, 3, 1), "", ""))
        .await
        .unwrap();

    let updated = tracker
        .tips
        .update(
            &mut session,
            user,
            id,
            TipUpdate {
                currency: Some(code("GBP")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated);
    let record = tracker.tips.get(&mut session, user, id).await.unwrap().unwrap();
    assert_eq!(Some("12.50".parse().unwrap()), record.base_amount);

    let missing = tracker
        .tips
        .update(&mut session, user, ObjectId::new(), TipUpdate::default())
        .await
        .unwrap();
    assert!(!missing);

    assert_eq!(1, tracker.tips.delete(&mut session, user, id).await.unwrap());
    assert_eq!(0, tracker.tips.delete(&mut session, user, id).await.unwrap());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_tip_moved_onto_existing_day_is_merged() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let kept = tracker
        .tips
        .add(&mut session, user, tip(10, "EUR", date(2024, 3, 2), "lunch", ""))
        .await
        .unwrap();
    let moved = tracker
        .tips
        .add(&mut session, user, tip(4, "EUR", date(2024, 3, 1), "dinner", ""))
        .await
        .unwrap();

    let updated = tracker
        .tips
        .update(
            &mut session,
            user,
            moved,
            TipUpdate {
                date: Some(date(2024, 3, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let tips = tracker
        .tips
        .list(&mut session, user, &TipFilter::default(), SortOrder::Descending)
        .await
        .unwrap();
    assert_eq!(1, tips.len());
    assert_eq!(kept, tips[0].id);
    assert_eq!(Decimal::int(14), tips[0].amount);
    assert_eq!("lunch; dinner", tips[0].notes);
    assert_eq!(Some(Decimal::int(28)), tips[0].base_amount);
    assert!(tracker.tips.get(&mut session, user, moved).await.unwrap().is_none());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_tip_filters_and_summary() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    for new_tip in [
        tip(10, "USD", date(2024, 1, 5), "", "Cafe Luna"),
        tip(20, "EUR", date(2024, 2, 5), "", "luna bar"),
        tip(30, "USD", date(2024, 3, 5), "", "Harbor"),
    ] {
        tracker.tips.add(&mut session, user, new_tip).await.unwrap();
    }

    let filter = TipFilter {
        location: Some("LUNA".to_owned()),
        ..Default::default()
    };
    let tips = tracker
        .tips
        .list(&mut session, user, &filter, SortOrder::Ascending)
        .await
        .unwrap();
    assert_eq!(2, tips.len());
    assert_eq!(date(2024, 1, 5), tips[0].date);

    let summary = tracker
        .tips
        .summary_stats(&mut session, user, Some(date(2024, 2, 1)), Some(date(2024, 3, 5)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(2, summary.count);
    assert_eq!(Decimal::int(70), summary.total_base);
    assert_eq!(Some(Decimal::int(40)), summary.usd_equivalents[&code("EUR")]);

    let nothing = tracker
        .tips
        .summary_stats(&mut session, user, Some(date(2025, 1, 1)), None)
        .await
        .unwrap();
    assert!(nothing.is_none());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_base_currency_change_rewrites_base_amounts() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let id = tracker
        .tips
        .add(&mut session, user, tip(10, "USD", date(2024, 3, 1), "note", ""))
        .await
        .unwrap();

    let updated = tracker
        .set_base_currency(&mut session, code("EUR"))
        .await
        .unwrap();
    assert_eq!(1, updated);
    assert_eq!(code("EUR"), tracker.currency.base_currency());
    assert_eq!(code("EUR"), tracker.settings(&mut session).await.unwrap().base_currency);

    let record = tracker.tips.get(&mut session, user, id).await.unwrap().unwrap();
    assert_eq!(Decimal::int(10), record.amount);
    assert_eq!(code("USD"), record.currency);
    assert_eq!("note", record.notes);
    assert_eq!(Some(Decimal::int(5)), record.base_amount);
    assert_eq!(code("EUR"), record.base_currency);

    assert!(tracker
        .set_base_currency(&mut session, code("XYZ"))
        .await
        .is_err());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_refresh_falls_back_to_cache() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    tracker.currency.use_rates(ExchangeRates::default());
    assert_eq!(RatesSource::Unavailable, tracker.currency.refresh(&mut session).await);
    assert_eq!(None, tracker.currency.rates_updated_at());
    assert_eq!(
        None,
        tracker
            .currency
            .convert(Decimal::int(1), &code("USD"), &code("EUR"))
    );
    assert_eq!(8, tracker.currency.available_currencies().len());

    tracker.currency.use_rates(rates());
    assert_eq!(RatesSource::Cached, tracker.currency.refresh(&mut session).await);

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_calories_accumulate_and_page() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let day = date(2024, 2, 10);
    tracker
        .calories
        .add(&mut session, user, day, Decimal::int(10))
        .await
        .unwrap();
    tracker
        .calories
        .add(&mut session, user, day, Decimal::int(5))
        .await
        .unwrap();
    let entry = tracker
        .calories
        .get(&mut session, user, day)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Decimal::int(15), entry.total_calories);
    assert!(tracker
        .calories
        .add(&mut session, user, day, Decimal::int(-5))
        .await
        .is_err());

    for d in 1..=11 {
        tracker
            .calories
            .add(&mut session, user, date(2024, 3, d), Decimal::int(2000))
            .await
            .unwrap();
    }
    let page = tracker
        .calories
        .list(
            &mut session,
            user,
            CalorieQuery {
                page: Page::new(2, 10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(2, page.total_pages);
    assert_eq!(2, page.entries.len());
    assert_eq!(date(2024, 3, 10), page.entries[0].date);

    let march = tracker
        .calories
        .average_over_range(&mut session, user, date(2024, 3, 1), date(2024, 3, 31))
        .await
        .unwrap();
    assert_eq!(Decimal::int(2000), march);
    let empty = tracker
        .calories
        .average_over_range(&mut session, user, date(2023, 1, 1), date(2023, 12, 31))
        .await
        .unwrap();
    assert_eq!(Decimal::zero(), empty);

    assert_eq!(1, tracker.calories.delete_day(&mut session, user, day).await.unwrap());
    assert_eq!(0, tracker.calories.delete_day(&mut session, user, day).await.unwrap());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_food_items() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let day = date(2024, 4, 1);
    assert_eq!(
        Upserted::Inserted,
        tracker
            .food_items
            .upsert(&mut session, user, "Oats", Decimal::int(380))
            .await
            .unwrap()
    );
    assert_eq!(
        Upserted::Updated,
        tracker
            .food_items
            .upsert(&mut session, user, "Oats", Decimal::int(389))
            .await
            .unwrap()
    );

    let added = tracker
        .food_items
        .log_servings(&mut session, user, "Oats", "0.5".parse().unwrap(), Some(day))
        .await
        .unwrap();
    assert_eq!("194.50", added.to_string());
    let entry = tracker
        .calories
        .get(&mut session, user, day)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(added, entry.total_calories);

    assert!(tracker
        .food_items
        .log_servings(&mut session, user, "Bread", Decimal::int(1), Some(day))
        .await
        .is_err());

    let items = tracker
        .food_items
        .list(&mut session, user, Page::default())
        .await
        .unwrap();
    assert_eq!(1, items.total_pages);
    assert_eq!(1, items.entries.len());
    let id = items.entries[0].id;
    assert_eq!(1, tracker.food_items.delete(&mut session, user, id).await.unwrap());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_users() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let id = tracker
        .users
        .sign_up(&mut session, "Ann@Example.com", Some("ann"), "secret")
        .await
        .unwrap();
    assert!(matches!(
        tracker
            .users
            .sign_up(&mut session, "ann@example.com", None, "other")
            .await,
        Err(SignUpError::AlreadyExists)
    ));
    assert!(matches!(
        tracker
            .users
            .sign_up(&mut session, "bob@example.com", Some("ann"), "other")
            .await,
        Err(SignUpError::AlreadyExists)
    ));
    assert!(matches!(
        tracker
            .users
            .sign_up(&mut session, "not-an-email", None, "other")
            .await,
        Err(SignUpError::Invalid(_))
    ));

    let by_email = tracker
        .users
        .login(&mut session, "ann@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(Some(id), by_email.map(|user| user.id));
    let by_name = tracker.users.login(&mut session, "ann", "secret").await.unwrap();
    assert_eq!(Some(id), by_name.map(|user| user.id));
    assert!(tracker
        .users
        .login(&mut session, "ann", "wrong")
        .await
        .unwrap()
        .is_none());

    tracker
        .tips
        .add(&mut session, id, tip(10, "USD", date(2024, 3, 1), "", ""))
        .await
        .unwrap();
    tracker
        .calories
        .add(&mut session, id, date(2024, 3, 1), Decimal::int(1800))
        .await
        .unwrap();

    assert!(matches!(
        tracker.users.delete(&mut session, id, "wrong").await,
        Err(DeleteUserError::WrongPassword)
    ));
    assert!(tracker.users.delete(&mut session, id, "secret").await.unwrap());
    assert!(!tracker.users.delete(&mut session, id, "secret").await.unwrap());
    assert!(tracker.users.get(&mut session, id).await.unwrap().is_none());
    let tips = tracker
        .tips
        .list(&mut session, id, &TipFilter::default(), SortOrder::Descending)
        .await
        .unwrap();
    assert!(tips.is_empty());
    let days = tracker
        .calories
        .days(&mut session, id, CalorieRange::All)
        .await
        .unwrap();
    assert!(days.is_empty());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_legacy_password_hash_is_upgraded() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let id = tracker
        .users
        .sign_up(&mut session, "old@example.com", None, "placeholder")
        .await
        .unwrap();
    tracker
        .db
        .collection::<Document>("users")
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "password": "pbkdf2:sha256:1000$Q1xVb3uZ$\
                a81d2072fdde7f7c06668c47ec7dbbebd3a6ad935b5fb7c937fa9956caca9a46" } },
        )
        .await
        .unwrap();

    assert!(tracker
        .users
        .login(&mut session, "old@example.com", "placeholder")
        .await
        .unwrap()
        .is_none());
    let user = tracker
        .users
        .login(&mut session, "old@example.com", "hunter2")
        .await
        .unwrap()
        .unwrap();
    assert!(user.password.starts_with("$argon2id$"));

    let stored = tracker.users.get(&mut session, id).await.unwrap().unwrap();
    assert!(stored.password.starts_with("$argon2id$"));
    assert!(tracker
        .users
        .login(&mut session, "old@example.com", "hunter2")
        .await
        .unwrap()
        .is_some());

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_import_legacy() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let id = tracker
        .users
        .sign_up(&mut session, "legacy@example.com", None, "secret")
        .await
        .unwrap();
    tracker
        .db
        .collection::<Document>(&legacy::calories_collection(id))
        .insert_many([
            doc! { "date": "2023-11-05", "total_calories": 1850.5 },
            doc! { "date": "broken", "total_calories": 10 },
        ])
        .await
        .unwrap();
    tracker
        .db
        .collection::<Document>(&legacy::calorie_items_collection(id))
        .insert_one(doc! { "food_item": "Oats", "calorie_amount": 389 })
        .await
        .unwrap();

    let imported = tracker.users.import_legacy(&mut session, id).await.unwrap();
    assert_eq!(1, imported.days);
    assert_eq!(1, imported.items);

    let day = tracker
        .calories
        .get(&mut session, id, date(2023, 11, 5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!("1850.50", day.total_calories.to_string());
    assert!(tracker
        .food_items
        .get(&mut session, id, "Oats")
        .await
        .unwrap()
        .is_some());

    let again = tracker.users.import_legacy(&mut session, id).await.unwrap();
    assert_eq!(0, again.days);

    tracker.db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_export_tips() {
    let Some((tracker, mut session)) = setup().await else {
        return;
    };
    let user = ObjectId::new();
    let path = std::env::temp_dir().join(format!("tips_{}.csv", user.to_hex()));
    assert!(!tracker
        .export
        .write_tips(&mut session, user, &TipFilter::default(), &path)
        .await
        .unwrap());

    tracker
        .tips
        .add(&mut session, user, tip(10, "EUR", date(2024, 3, 2), "", ""))
        .await
        .unwrap();
    tracker
        .tips
        .add(&mut session, user, tip(4, "USD", date(2024, 3, 1), "", ""))
        .await
        .unwrap();
    assert!(tracker
        .export
        .write_tips(&mut session, user, &TipFilter::default(), &path)
        .await
        .unwrap());
    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(3, lines.len());
    assert!(lines[1].starts_with("2024-03-01,4.00,USD"));
    std::fs::remove_file(&path).unwrap();

    tracker.db.drop_database().await.unwrap();
}
