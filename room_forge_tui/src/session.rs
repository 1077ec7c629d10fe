use anyhow::Result;
use clap::ValueEnum;
use room_forge_core::{
    Agent, EngagementTracker, Environment, EpisodeOutcome, LayoutArchive, PlanningAgent,
    RandomWalker, RoomData, RoomGenerator, TilePalette,
};

use crate::config::AppConfig;

/// Which agent plays each room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    /// Collects reachable items, then leaves through the nearest door.
    Planner,
    /// Steps in a random direction every turn.
    Random,
}

/// Summary of a finished episode.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeReport {
    pub episode: u64,
    pub seed: u64,
    pub steps: usize,
    pub exited: bool,
    pub outcome: EpisodeOutcome,
    pub archived: bool,
}

/// The generate, play, measure loop shared by the TUI and headless modes.
pub struct Session<H> {
    config: AppConfig,
    agent_kind: AgentKind,
    base_seed: u64,
    generator: RoomGenerator<H, Box<dyn LayoutArchive>>,
    tracker: EngagementTracker,
    room: RoomData,
    environment: Environment,
    episode: u64,
    last_report: Option<EpisodeReport>,
}

impl<H: Clone> Session<H> {
    pub fn new(
        config: AppConfig,
        agent_kind: AgentKind,
        base_seed: u64,
        palette: TilePalette<H>,
        archive: Box<dyn LayoutArchive>,
    ) -> Result<Self> {
        config.validate()?;
        let tracker = EngagementTracker::new(config.generator.engagement_increase_buffer)?;
        let mut generator = RoomGenerator::new(config.generator.clone(), palette, archive)?;
        let room = generator
            .generate(tracker.previous(), base_seed)?
            .room
            .clone();
        let environment = Self::spawn(&config, agent_kind, &room, base_seed)?;
        Ok(Session {
            config,
            agent_kind,
            base_seed,
            generator,
            tracker,
            room,
            environment,
            episode: 0,
            last_report: None,
        })
    }

    fn spawn(
        config: &AppConfig,
        agent_kind: AgentKind,
        room: &RoomData,
        seed: u64,
    ) -> Result<Environment> {
        let behavior: Box<dyn Agent> = match agent_kind {
            AgentKind::Planner => Box::new(PlanningAgent::new()),
            AgentKind::Random => Box::new(RandomWalker::new(seed)),
        };
        Ok(Environment::for_room(
            room,
            behavior,
            config.rewards,
            config.max_steps,
        )?)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn room(&self) -> &RoomData {
        &self.room
    }

    pub fn tracker(&self) -> &EngagementTracker {
        &self.tracker
    }

    pub fn generator(&self) -> &RoomGenerator<H, Box<dyn LayoutArchive>> {
        &self.generator
    }

    /// Index of the episode being played, starting at 0.
    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn last_report(&self) -> Option<&EpisodeReport> {
        self.last_report.as_ref()
    }

    fn seed_for(&self, episode: u64) -> u64 {
        self.base_seed.wrapping_add(episode)
    }

    /// Plays one turn. When the episode is over, closes it and starts the next room.
    pub fn tick(&mut self) -> Result<Option<EpisodeReport>> {
        if self.environment.is_finished() {
            return self.finish_episode().map(Some);
        }
        self.environment.process_turn(&mut self.tracker);
        Ok(None)
    }

    /// Plays the current episode to the end.
    pub fn run_episode(&mut self) -> Result<EpisodeReport> {
        while !self.environment.is_finished() {
            self.environment.process_turn(&mut self.tracker);
        }
        self.finish_episode()
    }

    /// Closes the running episode, whether or not the agent has left, and
    /// generates the next room from its engagement.
    pub fn finish_episode(&mut self) -> Result<EpisodeReport> {
        let outcome = self.tracker.end_episode();
        let archived = self.generator.complete_episode(&outcome);
        let report = EpisodeReport {
            episode: self.episode,
            seed: self.seed_for(self.episode),
            steps: self.environment.steps(),
            exited: self.environment.exit().is_some(),
            outcome,
            archived,
        };
        self.last_report = Some(report);

        self.episode += 1;
        let seed = self.seed_for(self.episode);
        match self.generator.generate(self.tracker.previous(), seed) {
            Ok(rendered) => self.room = rendered.room.clone(),
            // The previous room is still valid; replay it.
            Err(err) => log::error!("Replaying the last room: {}", err),
        }
        self.environment = Self::spawn(&self.config, self.agent_kind, &self.room, seed)?;
        Ok(report)
    }
}
