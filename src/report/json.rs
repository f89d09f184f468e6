//! JSON output for snapshot listings.

use super::SnapshotSummary;

pub fn render(summaries: &[SnapshotSummary]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SlotLayout, Store};
    use uuid::Uuid;

    #[test]
    fn listing_uses_camel_case_fields() {
        let store = Store::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let (armor, extra, main) = SlotLayout::default().empty_slots();
        let record = store.insert(owner, armor, extra, main, 50).unwrap();

        let text = render(&[SnapshotSummary::of(&record)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["id"], record.id.get());
        assert_eq!(value[0]["ownerId"], owner.to_string());
        assert_eq!(value[0]["level"], 4);
        assert_eq!(value[0]["mainItems"], 0);

        assert_eq!(render(&[]).unwrap(), "[]");
    }
}
