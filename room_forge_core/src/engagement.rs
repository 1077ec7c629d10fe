use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Range accepted for the hysteresis factor applied before a layout counts as the new best.
pub const INCREASE_BUFFER_RANGE: std::ops::RangeInclusive<f32> = 1.0..=3.0;

/// Telemetry gathered while an agent occupies one room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// Latest cumulative reward of the episode.
    pub reward_score: f32,
    pub exploration: f32,
    pub item_pickups: f32,
}

impl EngagementMetrics {
    pub const fn zero() -> Self {
        EngagementMetrics {
            reward_score: 0.0,
            exploration: 0.0,
            item_pickups: 0.0,
        }
    }

    pub fn new(reward_score: f32, exploration: f32, item_pickups: f32) -> Self {
        EngagementMetrics {
            reward_score,
            exploration,
            item_pickups,
        }
    }

    /// Copy with negative or non-finite values replaced by zero.
    pub fn sanitized(&self) -> Self {
        EngagementMetrics {
            reward_score: non_negative(self.reward_score),
            exploration: non_negative(self.exploration),
            item_pickups: non_negative(self.item_pickups),
        }
    }

    /// Unweighted sum of the three signals.
    pub fn score(&self) -> f32 {
        let m = self.sanitized();
        m.reward_score + m.exploration + m.item_pickups
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Result of closing an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    /// Metrics of the episode that just ended.
    pub metrics: EngagementMetrics,
    pub score: f32,
    /// Best score before this episode was considered.
    pub previous_best: f32,
    /// The episode beat `previous_best` by more than the increase buffer.
    pub new_best: bool,
}

/// Accumulates engagement for the running episode and remembers the best one seen.
#[derive(Debug, Clone)]
pub struct EngagementTracker {
    current: EngagementMetrics,
    previous: EngagementMetrics,
    highest: EngagementMetrics,
    increase_buffer: f32,
    cumulative_reward: f32,
    episodes: u64,
}

impl EngagementTracker {
    pub fn new(increase_buffer: f32) -> Result<Self, ConfigurationError> {
        if !INCREASE_BUFFER_RANGE.contains(&increase_buffer) {
            return Err(ConfigurationError::IncreaseBuffer(increase_buffer));
        }
        Ok(EngagementTracker {
            current: EngagementMetrics::zero(),
            previous: EngagementMetrics::zero(),
            highest: EngagementMetrics::zero(),
            increase_buffer,
            cumulative_reward: 0.0,
            episodes: 0,
        })
    }

    /// Starts from a known best layout, e.g. one restored from an archive.
    pub fn with_highest(mut self, highest: EngagementMetrics) -> Self {
        self.highest = highest.sanitized();
        self
    }

    pub fn current(&self) -> &EngagementMetrics {
        &self.current
    }

    pub fn previous(&self) -> &EngagementMetrics {
        &self.previous
    }

    pub fn highest(&self) -> &EngagementMetrics {
        &self.highest
    }

    pub fn increase_buffer(&self) -> f32 {
        self.increase_buffer
    }

    /// Number of episodes closed so far.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Adds `delta` to the episode reward; `reward_score` tracks the running total.
    pub fn record_reward(&mut self, delta: f32) {
        if !delta.is_finite() {
            log::warn!("Ignoring non-finite reward {}", delta);
            return;
        }
        self.cumulative_reward += delta;
        self.current.reward_score = non_negative(self.cumulative_reward);
    }

    /// Overwrites the reward with a cumulative value computed elsewhere.
    pub fn set_reward_score(&mut self, value: f32) {
        if value.is_finite() {
            self.cumulative_reward = value;
        }
        self.current.reward_score = non_negative(value);
    }

    pub fn record_exploration(&mut self, delta: f32) {
        self.current.exploration += increment("exploration", delta);
    }

    pub fn record_item_pickup(&mut self, value: f32) {
        self.current.item_pickups += increment("item pickup", value);
    }

    /// Closes the episode: snapshots it as `previous`, compares it against the
    /// best so far and resets the running metrics.
    pub fn end_episode(&mut self) -> EpisodeOutcome {
        self.previous = self.current;
        self.current = EngagementMetrics::zero();
        self.cumulative_reward = 0.0;
        self.episodes += 1;

        let score = self.previous.score();
        let previous_best = self.highest.score();
        let new_best = score > previous_best * self.increase_buffer;
        if new_best {
            log::info!(
                "Episode {} set a new best engagement {:.2} (previous best {:.2})",
                self.episodes,
                score,
                previous_best
            );
            self.highest = self.previous;
        }

        EpisodeOutcome {
            metrics: self.previous,
            score,
            previous_best,
            new_best,
        }
    }
}

fn increment(signal: &str, delta: f32) -> f32 {
    if delta.is_finite() && delta >= 0.0 {
        delta
    } else {
        log::warn!("Clamping {} increment {} to zero", signal, delta);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn tracker_with_best(best: f32, buffer: f32) -> EngagementTracker {
        EngagementTracker::new(buffer)
            .unwrap()
            .with_highest(EngagementMetrics::new(best, 0.0, 0.0))
    }

    #[test]
    fn test_score_is_sum() {
        let m = EngagementMetrics::new(1.5, 2.0, 3.0);
        assert_approx_eq!(m.score(), 6.5);
    }

    #[test]
    fn test_negative_metrics_clamp_to_zero() {
        let m = EngagementMetrics::new(-4.0, f32::NAN, 2.0);
        assert_eq!(m.sanitized(), EngagementMetrics::new(0.0, 0.0, 2.0));
        assert_approx_eq!(m.score(), 2.0);
    }

    #[test]
    fn test_buffer_range_is_validated() {
        assert!(EngagementTracker::new(1.0).is_ok());
        assert!(EngagementTracker::new(3.0).is_ok());
        assert_eq!(
            EngagementTracker::new(0.5).unwrap_err(),
            ConfigurationError::IncreaseBuffer(0.5)
        );
        assert!(EngagementTracker::new(3.5).is_err());
    }

    #[test]
    fn test_reward_is_cumulative() {
        let mut tracker = EngagementTracker::new(1.5).unwrap();
        tracker.record_reward(3.0);
        tracker.record_reward(6.0);
        tracker.record_reward(-1.0);
        assert_approx_eq!(tracker.current().reward_score, 8.0);
        tracker.set_reward_score(2.0);
        assert_approx_eq!(tracker.current().reward_score, 2.0);
        tracker.record_reward(1.0);
        assert_approx_eq!(tracker.current().reward_score, 3.0);
    }

    #[test]
    fn test_exploration_and_pickups_only_increase() {
        let mut tracker = EngagementTracker::new(1.5).unwrap();
        tracker.record_exploration(0.25);
        tracker.record_exploration(-5.0);
        tracker.record_item_pickup(2.0);
        tracker.record_item_pickup(f32::INFINITY);
        assert_approx_eq!(tracker.current().exploration, 0.25);
        assert_approx_eq!(tracker.current().item_pickups, 2.0);
    }

    #[test]
    fn test_end_episode_snapshots_and_resets() {
        let mut tracker = EngagementTracker::new(1.5).unwrap();
        tracker.record_reward(4.0);
        tracker.record_exploration(1.0);
        let outcome = tracker.end_episode();
        assert_eq!(outcome.metrics, EngagementMetrics::new(4.0, 1.0, 0.0));
        assert_eq!(*tracker.previous(), outcome.metrics);
        assert_eq!(*tracker.current(), EngagementMetrics::zero());
        assert_eq!(tracker.episodes(), 1);

        // Late telemetry lands in the next episode and the reward total restarts.
        tracker.record_reward(1.0);
        assert_approx_eq!(tracker.current().reward_score, 1.0);
        assert_eq!(tracker.previous().reward_score, 4.0);
    }

    #[test]
    fn test_new_best_when_above_buffer() {
        let mut tracker = tracker_with_best(50.0, 1.5);
        tracker.set_reward_score(100.0);
        let outcome = tracker.end_episode();
        assert!(outcome.new_best);
        assert_approx_eq!(outcome.previous_best, 50.0);
        assert_approx_eq!(tracker.highest().score(), 100.0);
    }

    #[test]
    fn test_no_new_best_within_buffer() {
        let mut tracker = tracker_with_best(80.0, 1.5);
        tracker.set_reward_score(100.0);
        let outcome = tracker.end_episode();
        assert!(!outcome.new_best);
        assert_approx_eq!(tracker.highest().score(), 80.0);
    }

    #[test]
    fn test_first_positive_episode_is_best() {
        let mut tracker = EngagementTracker::new(2.0).unwrap();
        assert!(!tracker.end_episode().new_best);
        tracker.record_item_pickup(1.0);
        assert!(tracker.end_episode().new_best);
    }
}
