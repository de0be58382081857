/// Fixed dataset for local development
///
/// Served by the client when the backend is unreachable in development, and
/// used to seed the in-memory store backend.
use crate::item::ContentItem;
use crate::status::{Platform, Status};
use chrono::{DateTime, TimeZone, Utc};

fn day(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn sample_items() -> Vec<ContentItem> {
    let mut in_review = ContentItem::draft(
        "2",
        Platform::LinkedIn,
        "Three lessons from shipping our first self-serve onboarding flow.",
        day(4, 10),
    )
    .with_topic("Product");
    in_review.status = Status::InReview;

    let mut changes = ContentItem::draft(
        "3",
        Platform::Instagram,
        "Behind the scenes of our community meetup 📸",
        day(5, 14),
    )
    .with_topic("Community");
    changes.status = Status::ChangesRequested;
    changes.last_feedback = Some("Swap the cover photo and shorten the caption.".to_string());
    changes.last_feedback_date = Some(day(6, 9));

    let mut approved = ContentItem::draft(
        "4",
        Platform::Reddit,
        "AMA: we rebuilt our review pipeline around a spreadsheet. Ask us anything.",
        day(6, 11),
    )
    .with_topic("Engineering");
    approved.status = Status::Approved;
    approved.date_approved = Some(day(7, 16));
    approved.approved_by = Some("System".to_string());

    let mut published = ContentItem::draft(
        "5",
        Platform::Skool,
        "Weekly challenge: post your first draft and tag a reviewer.",
        day(7, 8),
    )
    .with_topic("Community");
    published.status = Status::Published;
    published.date_approved = Some(day(7, 12));
    published.approved_by = Some("System".to_string());
    published.final_approval_date = Some(day(7, 13));
    published.post_scheduled_date = Some(day(8, 9));
    published.posted_by = Some("Social Team".to_string());
    published.post_link = Some("https://www.skool.com/community/weekly-challenge".to_string());

    vec![
        ContentItem::draft(
            "1",
            Platform::Twitter,
            "Launch week starts Monday. Here's what we're shipping 🧵",
            day(3, 9),
        )
        .with_topic("Launch"),
        in_review,
        changes,
        approved,
        published,
    ]
}
