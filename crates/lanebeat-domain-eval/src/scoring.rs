use lanebeat_ports::storage::ScoringDto;
use lanebeat_ports::types::Tier;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
pub struct ScoringConfig {
    pub base_points: i64,
    /// Streak needed to leave multiplier `i + 1`. The multiplier caps at
    /// `thresholds.len() + 1`.
    pub multiplier_thresholds: Vec<u32>,
    /// Scale points by tier instead of awarding `base_points` flat.
    pub tier_scaled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub ok: u32,
    pub miss: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: i64,
    pub multiplier: u32,
    pub streak: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub counts: TierCounts,
    /// Weighted accuracy in `[0, 1]`; 1 when nothing has been judged yet.
    pub accuracy: f64,
}

pub struct ScoreTracker {
    cfg: ScoringConfig,
    score: i64,
    multiplier: u32,
    streak: u32,
    combo: u32,
    max_combo: u32,
    counts: TierCounts,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        (&ScoringDto::default()).into()
    }
}

impl From<&ScoringDto> for ScoringConfig {
    fn from(dto: &ScoringDto) -> Self {
        Self {
            base_points: dto.base_points,
            multiplier_thresholds: dto.multiplier_thresholds.clone(),
            tier_scaled: dto.tier_scaled,
        }
    }
}

impl TierCounts {
    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.good + self.ok + self.miss
    }

    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Perfect => self.perfect,
            Tier::Great => self.great,
            Tier::Good => self.good,
            Tier::Ok => self.ok,
            Tier::Miss => self.miss,
        }
    }

    fn record(&mut self, tier: Tier) {
        let slot = match tier {
            Tier::Perfect => &mut self.perfect,
            Tier::Great => &mut self.great,
            Tier::Good => &mut self.good,
            Tier::Ok => &mut self.ok,
            Tier::Miss => &mut self.miss,
        };
        *slot += 1;
    }
}

impl ScoreTracker {
    pub fn new(cfg: ScoringConfig) -> Self {
        Self {
            cfg,
            score: 0,
            multiplier: 1,
            streak: 0,
            combo: 0,
            max_combo: 0,
            counts: TierCounts::default(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.cfg
    }

    pub fn on_judgement(&mut self, tier: Tier) -> ScoreSnapshot {
        self.counts.record(tier);

        if tier.is_miss() {
            self.multiplier = 1;
            self.streak = 0;
            self.combo = 0;
            return self.snapshot();
        }

        let level = (self.multiplier - 1) as usize;
        if let Some(&threshold) = self.cfg.multiplier_thresholds.get(level) {
            self.streak += 1;
            if threshold <= self.streak {
                self.streak = 0;
                self.multiplier += 1;
            }
        }

        self.score += self.points_for(tier) * i64::from(self.multiplier);
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            multiplier: self.multiplier,
            streak: self.streak,
            combo: self.combo,
            max_combo: self.max_combo,
            counts: self.counts,
            accuracy: self.accuracy(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cfg.clone());
    }

    fn points_for(&self, tier: Tier) -> i64 {
        if !self.cfg.tier_scaled {
            return self.cfg.base_points;
        }
        self.cfg.base_points * tier_percent(tier) / 100
    }

    fn accuracy(&self) -> f64 {
        let total = self.counts.total();
        if total == 0 {
            return 1.0;
        }
        let weighted: i64 = [Tier::Perfect, Tier::Great, Tier::Good, Tier::Ok]
            .into_iter()
            .map(|tier| i64::from(self.counts.get(tier)) * tier_percent(tier))
            .sum();
        weighted as f64 / (f64::from(total) * 100.0)
    }
}

fn tier_percent(tier: Tier) -> i64 {
    match tier {
        Tier::Perfect => 100,
        Tier::Great => 80,
        Tier::Good => 50,
        Tier::Ok => 20,
        Tier::Miss => 0,
    }
}
