use crate::clock::DayKey;
use crate::models::{CompletionRecord, DEFAULT_AVATAR, MemberId, MemberStats};
use std::collections::BTreeMap;

const WEEK_DAYS: i64 = 7;

pub fn build_member_stats_at(
    today: DayKey,
    records: &[CompletionRecord],
) -> BTreeMap<MemberId, MemberStats> {
    let week_ago = today.days_before(WEEK_DAYS);
    let mut stats: BTreeMap<MemberId, MemberStats> = BTreeMap::new();

    for record in records {
        let Some(member_id) = &record.completed_by else {
            continue;
        };
        let entry = stats
            .entry(member_id.clone())
            .or_insert_with(|| MemberStats {
                name: if record.completed_by_name.is_empty() {
                    "Unknown".to_owned()
                } else {
                    record.completed_by_name.clone()
                },
                avatar: if record.completed_by_avatar.is_empty() {
                    DEFAULT_AVATAR.to_owned()
                } else {
                    record.completed_by_avatar.clone()
                },
                ..MemberStats::default()
            });

        entry.total = entry.total.saturating_add(1);
        if record.date == today {
            entry.today = entry.today.saturating_add(1);
        }
        if record.date >= week_ago {
            entry.this_week = entry.this_week.saturating_add(1);
        }
    }

    stats
}

pub fn member_stats_for(
    today: DayKey,
    records: &[CompletionRecord],
    member: &MemberId,
) -> MemberStats {
    build_member_stats_at(today, records)
        .remove(member)
        .unwrap_or_default()
}
