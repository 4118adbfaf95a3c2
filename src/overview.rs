use crate::record::{hour_label, AdChannel, CanonicalRecord, HOURS};
use crate::stats::round2;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSlot {
    pub hour: String,
    /// Records with a positive rank in this hour.
    pub exposed: usize,
    /// Mean rank over exposed records, 0 when none.
    pub mean_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub total_records: usize,
    pub pc_records: usize,
    pub mobile_records: usize,
    pub mean_active_hours: f64,
    /// Hour with the fewest exposed records; earliest wins ties.
    pub quietest_hour: String,
    pub hourly: Vec<HourSlot>,
}

pub fn overview(records: &[CanonicalRecord]) -> DatasetOverview {
    let mut exposed = [0usize; HOURS];
    let mut rank_sum = [0f64; HOURS];
    for rec in records {
        for (h, v) in rec.hours.iter().enumerate() {
            if *v > 0.0 {
                exposed[h] += 1;
                rank_sum[h] += v;
            }
        }
    }

    let hourly: Vec<HourSlot> = (0..HOURS)
        .map(|h| HourSlot {
            hour: hour_label(h).to_string(),
            exposed: exposed[h],
            mean_rank: if exposed[h] == 0 { 0.0 } else { round2(rank_sum[h] / exposed[h] as f64) },
        })
        .collect();

    let quietest = exposed.iter().position_min().unwrap_or(0);
    let pc_records = records.iter().filter(|r| r.ad_area == AdChannel::Pc).count();
    let active_total: usize = records.iter().map(|r| r.active_hours()).sum();
    let mean_active_hours = if records.is_empty() {
        0.0
    } else {
        round2(active_total as f64 / records.len() as f64)
    };

    DatasetOverview {
        total_records: records.len(),
        pc_records,
        mobile_records: records.len() - pc_records,
        mean_active_hours,
        quietest_hour: hour_label(quietest).to_string(),
        hourly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_all_zero() {
        let o = overview(&[]);
        assert_eq!(o.total_records, 0);
        assert_eq!(o.mean_active_hours, 0.0);
        assert_eq!(o.quietest_hour, "00");
        assert_eq!(o.hourly.len(), HOURS);
        assert!(o.hourly.iter().all(|s| s.exposed == 0 && s.mean_rank == 0.0));
    }

    #[test]
    fn hourly_mean_skips_unexposed_records() {
        let mut a = [0.0; HOURS];
        a[5] = 2.0;
        a[6] = 1.0;
        let mut b = [0.0; HOURS];
        b[5] = 5.0;
        let recs = vec![
            CanonicalRecord::new("a", AdChannel::Pc, a),
            CanonicalRecord::new("b", AdChannel::Mobile, b),
        ];
        let o = overview(&recs);
        assert_eq!(o.hourly[5].exposed, 2);
        assert_eq!(o.hourly[5].mean_rank, 3.5);
        assert_eq!(o.hourly[6].mean_rank, 1.0);
        assert_eq!(o.pc_records, 1);
        assert_eq!(o.mobile_records, 1);
        assert_eq!(o.mean_active_hours, 1.5);
    }
}
