use std::collections::BTreeSet;

use super::normalize::{facing_of, normalize_camera_angle, normalize_lighting, normalize_shot_type};
use super::rules::{classify_detail, matches_term};
use super::types::{DescriptorRecord, PoseDescriptor};
use crate::config::AggregatorConfig;
use crate::core::types::{
    Attribute, AttributeStat, Category, DetailCategory, Filters, PreferenceTable,
};

/// Builds a per-request [`PreferenceTable`] from a user's recent descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorAggregator {
    max_records: usize,
}

impl DescriptorAggregator {
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            max_records: config.max_records.max(1),
        }
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Count attributes over the most recent window. Empty input yields an
    /// empty table.
    pub fn aggregate(&self, records: &[DescriptorRecord]) -> PreferenceTable {
        count_all(records.iter().take(self.max_records))
    }

    /// Aggregate after narrowing by `filters`. When the filters exclude every
    /// record, the unfiltered window is used instead.
    pub fn aggregate_filtered(
        &self,
        records: &[DescriptorRecord],
        filters: &Filters,
    ) -> (PreferenceTable, usize) {
        let window = &records[..records.len().min(self.max_records)];
        let matching: Vec<&DescriptorRecord> = window
            .iter()
            .filter(|record| record_matches(record, filters))
            .collect();

        if matching.is_empty() && !window.is_empty() {
            tracing::debug!(
                records = window.len(),
                "filters matched no descriptor records, aggregating the full window"
            );
            return (count_all(window), window.len());
        }
        let considered = matching.len();
        (count_all(matching), considered)
    }
}

fn count_all<'r>(records: impl IntoIterator<Item = &'r DescriptorRecord>) -> PreferenceTable {
    let mut table = PreferenceTable::new();
    for record in records {
        count_record(&mut table, record);
    }
    table
}

pub fn record_matches(record: &DescriptorRecord, filters: &Filters) -> bool {
    let garment_ok = filters.garment_type.as_deref().is_none_or(|wanted| {
        record
            .garment_types()
            .any(|g| matches_term(&g, wanted) || matches_term(wanted, &g))
    });
    let season_ok = filters.season.as_deref().is_none_or(|wanted| {
        record
            .context
            .season
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(wanted))
    });
    let occasion_ok = filters.occasion.as_deref().is_none_or(|wanted| {
        record
            .context
            .occasion
            .as_deref()
            .is_some_and(|o| o.eq_ignore_ascii_case(wanted))
    });
    garment_ok && season_ok && occasion_ok
}

/// Per-record counting state: each (category, key) counts at most once per image.
struct Tally<'a> {
    table: &'a mut PreferenceTable,
    seen: BTreeSet<(Category, String)>,
}

impl Tally<'_> {
    fn bump(&mut self, key: &str, payload: Attribute, garment: Option<&str>) {
        let category = payload.category();
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        let stat = self
            .table
            .entry(category)
            .or_default()
            .entry(key.clone())
            .or_insert_with(|| AttributeStat {
                count: 0,
                payload,
                garments: BTreeSet::new(),
            });
        if let Some(garment) = garment {
            stat.garments.insert(garment.to_lowercase());
        }
        if self.seen.insert((category, key)) {
            stat.count = stat.count.saturating_add(1);
        }
    }
}

fn count_record(table: &mut PreferenceTable, record: &DescriptorRecord) {
    let mut tally = Tally {
        table,
        seen: BTreeSet::new(),
    };

    if let Some(aesthetic) = record.context.aesthetic.as_deref() {
        tally.bump(
            aesthetic,
            Attribute::Style {
                aesthetic: aesthetic.to_lowercase(),
                mood: record.context.mood.as_deref().map(str::to_lowercase),
            },
            None,
        );
    }

    for garment in record.garments.iter() {
        let garment_type = garment.is_known().then(|| garment.garment_type.to_lowercase());
        let owner = garment_type.as_deref();

        if let Some(garment_type) = owner {
            tally.bump(
                garment_type,
                Attribute::Garment {
                    garment_type: garment_type.to_string(),
                    silhouette: garment.silhouette.as_deref().map(str::to_lowercase),
                },
                Some(garment_type),
            );
        }

        if let Some(material) = garment.fabric.material.as_deref() {
            tally.bump(
                material,
                Attribute::Fabric {
                    material: material.to_lowercase(),
                    finish: garment.fabric.finish.as_deref().map(str::to_lowercase),
                },
                owner,
            );
        }

        for color in &garment.colors {
            tally.bump(
                color,
                Attribute::Color {
                    name: color.to_lowercase(),
                },
                owner,
            );
        }

        if let Some(silhouette) = garment.silhouette.as_deref() {
            let detail = format!("{} silhouette", silhouette.to_lowercase());
            tally.bump(
                &detail.clone(),
                Attribute::Construction {
                    detail,
                    category: DetailCategory::Silhouette,
                },
                owner,
            );
        }

        for detail in &garment.construction {
            tally.bump(
                detail,
                Attribute::Construction {
                    detail: detail.to_lowercase(),
                    category: classify_detail(detail),
                },
                owner,
            );
        }
    }

    let photography = &record.photography;
    let shot_type = normalize_shot_type(photography.shot_type.as_deref());
    let facing = facing_of(&photography.pose);
    if photography.shot_type.is_some() || photography.pose != PoseDescriptor::default() {
        tally.bump(
            &format!("{shot_type}|{facing}"),
            Attribute::Pose {
                shot_type: shot_type.clone(),
                facing,
            },
            None,
        );
    }

    if photography.lighting.is_some() || photography.camera_angle.is_some() {
        let lighting = normalize_lighting(photography.lighting.as_deref());
        let camera_angle = normalize_camera_angle(photography.camera_angle.as_deref());
        tally.bump(
            &format!("{shot_type}|{lighting}|{camera_angle}"),
            Attribute::Photography {
                shot_type,
                lighting,
                camera_angle,
            },
            None,
        );
    }

    for accessory in &record.styling.accessories {
        tally.bump(
            accessory,
            Attribute::Accessory {
                name: accessory.to_lowercase(),
            },
            None,
        );
    }
}
