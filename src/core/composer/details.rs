use crate::core::descriptor::rules::classify_garment;
use crate::core::types::DetailCategory;

/// Design-detail slots in the positive prompt.
pub const DETAIL_SLOTS: usize = 3;

/// Pick up to three details by family priority, topping up with
/// garment-specific fallbacks when the data has fewer.
pub fn select_details(found: &[(DetailCategory, &str)], garment_type: Option<&str>) -> Vec<String> {
    let mut ranked: Vec<(DetailCategory, &str)> = found
        .iter()
        .map(|(category, detail)| (*category, detail.trim()))
        .filter(|(_, detail)| !detail.is_empty())
        .collect();
    ranked.sort_by_key(|(category, _)| *category);

    let mut details: Vec<String> = Vec::with_capacity(DETAIL_SLOTS);
    for (_, detail) in ranked {
        push_unique(&mut details, detail);
        if details.len() == DETAIL_SLOTS {
            return details;
        }
    }

    let class = classify_garment(garment_type.unwrap_or_default());
    for (_, fallback) in class.fallback_details() {
        if details.len() == DETAIL_SLOTS {
            break;
        }
        push_unique(&mut details, fallback);
    }
    details
}

fn push_unique(details: &mut Vec<String>, detail: &str) {
    if !details.iter().any(|d| d.eq_ignore_ascii_case(detail)) {
        details.push(detail.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_family_priority() {
        let found = [
            (DetailCategory::Hardware, "brass snaps"),
            (DetailCategory::Pockets, "flap pockets"),
            (DetailCategory::Silhouette, "boxy silhouette"),
            (DetailCategory::Closure, "two-way zip"),
            (DetailCategory::Sleeves, "raglan sleeves"),
        ];
        assert_eq!(
            select_details(&found, Some("bomber jacket")),
            vec!["boxy silhouette", "raglan sleeves", "two-way zip"]
        );
    }

    #[test]
    fn tops_up_with_garment_fallbacks() {
        let found = [(DetailCategory::Pockets, "patch pockets")];
        assert_eq!(
            select_details(&found, Some("bomber jacket")),
            vec!["patch pockets", "structured shoulders", "front zip closure"]
        );
    }

    #[test]
    fn unknown_garment_uses_generic_fallbacks() {
        assert_eq!(
            select_details(&[], None),
            vec!["clean lines", "refined finishing", "precise tailoring"]
        );
    }

    #[test]
    fn duplicates_do_not_take_slots() {
        let found = [
            (DetailCategory::Closure, "Front Zip Closure"),
            (DetailCategory::Closure, "front zip closure"),
        ];
        let details = select_details(&found, Some("parka"));
        assert_eq!(details.len(), DETAIL_SLOTS);
        assert_eq!(details, vec!["Front Zip Closure", "structured shoulders", "welt pockets"]);
    }
}
