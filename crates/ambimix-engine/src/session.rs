//! Session orchestration.
//!
//! A [`Session`] owns the mixer, the preset store, and the countdown timer,
//! turns user intents into mutations of those, drives the audio output, and
//! publishes [`Notification`]s for whatever presents the state.

use std::collections::{HashMap, HashSet};

use ambimix_core::mixer::{MAX_VOLUME, RESUME_VOLUME};
use ambimix_core::{
    Catalog, Command, CountdownTimer, Error, MixerState, Notification, PresetSummary,
    SessionSnapshot, TimerEvent, Toggle, VolumeSnapshot,
};
use ambimix_store::PresetStore;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::input::LevelInput;
use crate::output::{AudioOutput, PlayError, PlayFuture};

/// Capacity of the notification channel.
const NOTIFICATION_CAPACITY: usize = 256;

/// A play request whose outcome is not known yet.
pub struct PendingPlay {
    pub channel: String,
    /// Identifies this request among all plays of the channel
    pub ticket: u64,
    pub future: PlayFuture,
}

/// Result of a processed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Done,
    /// Channel or aggregate play state after a toggle
    Playing(bool),
    PresetSaved { id: String },
    PresetDeleted(bool),
}

/// The running mixer session.
pub struct Session {
    catalog: Catalog,
    mixer: MixerState,
    presets: PresetStore,
    timer: CountdownTimer,
    output: Box<dyn AudioOutput + Send>,
    levels: Box<dyn LevelInput + Send>,
    events: broadcast::Sender<Notification>,
    /// Channels the output loaded successfully
    loaded: HashSet<String>,
    /// Latest play ticket per channel
    tickets: HashMap<String, u64>,
    next_ticket: u64,
    pending: Vec<PendingPlay>,
    active_preset: Option<String>,
    any_playing: bool,
}

impl Session {
    /// Create a session with every catalog channel silent and stopped.
    pub fn new(
        catalog: Catalog,
        presets: PresetStore,
        output: impl AudioOutput + Send + 'static,
        levels: impl LevelInput + Send + 'static,
    ) -> Self {
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let mixer = MixerState::new(&catalog);

        Self {
            catalog,
            mixer,
            presets,
            timer: CountdownTimer::new(),
            output: Box::new(output),
            levels: Box::new(levels),
            events,
            loaded: HashSet::new(),
            tickets: HashMap::new(),
            next_ticket: 0,
            pending: Vec::new(),
            active_preset: None,
            any_playing: false,
        }
    }

    /// Load every catalog channel into the audio output.
    ///
    /// Returns the number of channels that loaded.
    pub fn load_catalog(&mut self, audio_dir: &str) -> usize {
        for channel in self.catalog.channels() {
            let source = channel.source_locator(audio_dir);
            if self.output.load(&channel.id, &source) {
                debug!(channel = %channel.id, source = %source, "Channel loaded");
                self.loaded.insert(channel.id.clone());
            } else {
                warn!(channel = %channel.id, source = %source, "Could not load channel");
            }
        }

        info!(loaded = self.loaded.len(), total = self.catalog.channels().len(), "Catalog loaded");
        self.loaded.len()
    }

    /// Subscribe to notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Sender side of the notification channel.
    #[must_use]
    pub fn notifier(&self) -> broadcast::Sender<Notification> {
        self.events.clone()
    }

    #[must_use]
    pub fn mixer(&self) -> &MixerState {
        &self.mixer
    }

    #[must_use]
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    #[must_use]
    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    #[must_use]
    pub fn active_preset(&self) -> Option<&str> {
        self.active_preset.as_deref()
    }

    /// Apply a command and report its outcome.
    ///
    /// # Errors
    /// Returns the error of the underlying operation.
    pub fn execute(&mut self, command: Command) -> EngineResult<Reply> {
        debug!(?command, "Executing command");

        match command {
            Command::ToggleChannel { channel } => self.toggle_channel(&channel).map(Reply::Playing),
            Command::SetChannelVolume { channel, volume } => {
                self.set_channel_volume(&channel, volume).map(|_| Reply::Done)
            }
            Command::SetMasterVolume { volume } => self.set_master_volume(volume).map(|()| Reply::Done),
            Command::ToggleAll => Ok(Reply::Playing(self.toggle_all())),
            Command::SaveCurrentMix { name } => {
                self.save_current_mix(&name).map(|id| Reply::PresetSaved { id })
            }
            Command::ApplyPreset { id, custom } => self.apply_preset(&id, custom).map(|()| Reply::Done),
            Command::DeletePreset { id } => self.delete_preset(&id).map(Reply::PresetDeleted),
            Command::StartTimer { minutes } => {
                self.start_timer(minutes);
                Ok(Reply::Done)
            }
            Command::StopTimer => {
                self.stop_timer();
                Ok(Reply::Done)
            }
            Command::ResetAll => {
                self.reset_all();
                Ok(Reply::Done)
            }
            Command::Shutdown => {
                self.shutdown();
                Ok(Reply::Done)
            }
        }
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.events.send(notification);
    }

    /// Record a channel's visible level, then announce it.
    fn announce_volume(&self, channel: &str, volume: u8) {
        self.levels.record(channel, volume);
        self.notify(Notification::ChannelVolumeChanged { channel: channel.to_string(), volume });
    }

    fn require_channel(&self, id: &str) -> EngineResult<()> {
        if self.mixer.contains(id) {
            return Ok(());
        }
        warn!(channel = %id, "Unknown channel");
        Err(Error::UnknownChannel(id.to_string()).into())
    }

    fn sync_any_playing(&mut self) {
        let playing = self.mixer.is_any_playing();
        if playing != self.any_playing {
            self.any_playing = playing;
            self.notify(Notification::AnyPlayingChanged { playing });
        }
    }

    fn start_playback(&mut self, channel: &str, fraction: f32) {
        self.output.set_volume_fraction(channel, fraction);

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.tickets.insert(channel.to_string(), ticket);

        let future = self.output.play(channel);
        self.pending.push(PendingPlay { channel: channel.to_string(), ticket, future });
        self.notify(Notification::ChannelPlayStateChanged { channel: channel.to_string(), playing: true });
    }

    fn stop_playback(&mut self, channel: &str) {
        self.output.pause(channel);
        self.notify(Notification::ChannelPlayStateChanged { channel: channel.to_string(), playing: false });
    }

    /// Turn a channel on or off. Returns whether it is now playing.
    ///
    /// Turning on resumes at the channel's slider level, or 50 if the slider
    /// sits at 0. A channel the output could not load stays off.
    ///
    /// # Errors
    /// Returns `UnknownChannel` for ids outside the catalog.
    pub fn toggle_channel(&mut self, id: &str) -> EngineResult<bool> {
        self.require_channel(id)?;

        if self.mixer.channel(id).is_some_and(|c| c.playing) {
            self.mixer.toggle_channel(id)?;
            self.stop_playback(id);
            self.sync_any_playing();
            info!(channel = %id, "Channel paused");
            return Ok(false);
        }

        if !self.loaded.contains(id) {
            warn!(channel = %id, "Channel not loaded in audio output, skipping");
            return Ok(false);
        }

        let slider = self.levels.level(id).unwrap_or(0);
        let volume = match slider {
            0 => RESUME_VOLUME,
            level => level.min(MAX_VOLUME),
        };
        if volume != slider {
            self.announce_volume(id, volume);
        }

        self.mixer.set_channel_volume(id, volume)?;
        if let Toggle::Play { fraction, .. } = self.mixer.toggle_channel(id)? {
            self.start_playback(id, fraction);
        }
        self.sync_any_playing();

        info!(channel = %id, volume, "Channel playing");
        Ok(true)
    }

    /// Set a channel's individual volume and forward its effective level.
    ///
    /// # Errors
    /// Returns `UnknownChannel` or `InvalidVolume`.
    pub fn set_channel_volume(&mut self, id: &str, volume: u8) -> EngineResult<f32> {
        self.require_channel(id)?;
        let fraction = self.mixer.set_channel_volume(id, volume)?;

        self.output.set_volume_fraction(id, fraction);
        self.announce_volume(id, volume);
        Ok(fraction)
    }

    /// Set the master volume and re-apply every playing channel's level.
    ///
    /// # Errors
    /// Returns `InvalidVolume` above 100.
    pub fn set_master_volume(&mut self, volume: u8) -> EngineResult<()> {
        let updates = self.mixer.set_master_volume(volume)?;
        for (channel, fraction) in &updates {
            self.output.set_volume_fraction(channel, *fraction);
        }

        debug!(volume, updated = updates.len(), "Master volume applied");
        self.notify(Notification::MasterVolumeChanged { volume });
        Ok(())
    }

    /// Pause everything if anything plays, otherwise resume every channel.
    ///
    /// Returns whether anything is playing afterwards.
    pub fn toggle_all(&mut self) -> bool {
        if self.mixer.is_any_playing() {
            self.pause_all();
        } else {
            self.play_all();
        }
        self.mixer.is_any_playing()
    }

    /// Turn on every loaded channel at its slider level.
    pub fn play_all(&mut self) {
        let (levels, loaded) = (&self.levels, &self.loaded);
        let activated = self.mixer.play_all(|id| if loaded.contains(id) { levels.level(id) } else { None });

        for activation in activated {
            self.announce_volume(&activation.channel, activation.volume);
            self.start_playback(&activation.channel, activation.fraction);
        }
        self.sync_any_playing();
    }

    /// Turn off every playing channel.
    pub fn pause_all(&mut self) {
        for channel in self.mixer.pause_all() {
            self.stop_playback(&channel);
        }
        self.sync_any_playing();
    }

    /// Save the current mix as a custom preset and return its id.
    ///
    /// # Errors
    /// Returns `EmptyMix` if every channel is silent, `InvalidPresetName` for a
    /// blank name, `DuplicateName` if the name is taken, or a store error.
    pub fn save_current_mix(&mut self, name: &str) -> EngineResult<String> {
        let snapshot: VolumeSnapshot = self.mixer.snapshot();
        if !snapshot.values().any(|v| *v > 0) {
            return Err(Error::EmptyMix.into());
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidPresetName(name.to_string()).into());
        }
        if self.presets.name_exists(name) {
            return Err(Error::DuplicateName(name.to_string()).into());
        }

        let id = self.presets.save_preset(name, &snapshot)?;
        self.notify(Notification::PresetAdded { id: id.clone(), name: name.to_string() });
        Ok(id)
    }

    /// Delete a custom preset. Returns whether it existed.
    ///
    /// # Errors
    /// Returns a store error if the preset document cannot be written.
    pub fn delete_preset(&mut self, id: &str) -> EngineResult<bool> {
        let deleted = self.presets.delete_preset(id)?;
        if deleted {
            self.notify(Notification::PresetRemoved { id: id.to_string() });
        } else {
            debug!(id = %id, "No preset to delete");
        }
        Ok(deleted)
    }

    /// Replace the current mix with a preset's volumes.
    ///
    /// Every channel is stopped and zeroed first. Listed channels that are not
    /// part of the catalog or did not load are skipped.
    ///
    /// # Errors
    /// Returns `PresetNotFound` if the preset cannot be resolved.
    pub fn apply_preset(&mut self, id: &str, custom: bool) -> EngineResult<()> {
        let volumes = if custom {
            self.presets.load_preset(id)?.volumes.clone()
        } else {
            self.catalog
                .preset(id)
                .map(|p| p.volumes.clone())
                .ok_or_else(|| Error::PresetNotFound(id.to_string()))?
        };

        for channel in self.mixer.stop_all() {
            self.stop_playback(&channel);
        }
        let ids: Vec<String> = self.mixer.channels().iter().map(|c| c.id.clone()).collect();
        for channel in &ids {
            self.announce_volume(channel, 0);
        }

        for (channel, volume) in volumes {
            if !self.mixer.contains(&channel) {
                warn!(preset = %id, channel = %channel, "Preset channel not in catalog, skipping");
                continue;
            }

            let fraction = match self.mixer.set_channel_volume(&channel, volume) {
                Ok(fraction) => fraction,
                Err(e) => {
                    warn!(preset = %id, channel = %channel, error = %e, "Skipping preset channel");
                    continue;
                }
            };
            self.announce_volume(&channel, volume);

            if !self.loaded.contains(&channel) {
                warn!(preset = %id, channel = %channel, "Channel not loaded in audio output, skipping");
                continue;
            }

            self.mixer.toggle_channel(&channel)?;
            self.start_playback(&channel, fraction);
        }

        self.active_preset = Some(id.to_string());
        self.notify(Notification::ActivePresetChanged { id: Some(id.to_string()) });
        self.sync_any_playing();

        info!(preset = %id, custom, "Preset applied");
        Ok(())
    }

    fn forward_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick { minutes, seconds } => {
                self.notify(Notification::TimerTick { minutes, seconds });
            }
            TimerEvent::Completed => self.on_timer_complete(),
        }
    }

    /// Start the sleep timer. Zero or negative minutes stop it.
    pub fn start_timer(&mut self, minutes: i64) {
        let event = self.timer.start(minutes);
        self.forward_timer_event(event);
    }

    /// Cancel the sleep timer.
    pub fn stop_timer(&mut self) {
        let event = self.timer.stop();
        self.forward_timer_event(event);
    }

    /// Advance the sleep timer by one second.
    pub fn tick_timer(&mut self) {
        for event in self.timer.tick() {
            self.forward_timer_event(event);
        }
    }

    /// Pause every playing channel once the sleep timer runs out.
    ///
    /// Stored volumes are kept, so the mix can still be saved afterwards.
    pub fn on_timer_complete(&mut self) {
        for channel in self.mixer.suspend_all() {
            self.stop_playback(&channel);
        }
        self.sync_any_playing();

        info!("Sleep timer elapsed, playback paused");
        self.notify(Notification::TimerCompleted);
    }

    /// Restore defaults: master 100, all channels silent, timer idle, no active preset.
    pub fn reset_all(&mut self) {
        let playing: Vec<String> =
            self.mixer.channels().iter().filter(|c| c.playing).map(|c| c.id.clone()).collect();
        self.mixer.reset_all();

        for channel in playing {
            self.stop_playback(&channel);
        }
        let ids: Vec<String> = self.mixer.channels().iter().map(|c| c.id.clone()).collect();
        for channel in &ids {
            self.announce_volume(channel, 0);
        }
        self.notify(Notification::MasterVolumeChanged { volume: self.mixer.master_volume() });

        self.stop_timer();

        self.active_preset = None;
        self.notify(Notification::ActivePresetChanged { id: None });
        self.sync_any_playing();

        info!("Session reset");
    }

    /// Hand out play requests issued since the last call.
    pub fn take_pending_plays(&mut self) -> Vec<PendingPlay> {
        std::mem::take(&mut self.pending)
    }

    /// Apply the outcome of a play request.
    ///
    /// A refusal rolls the channel back to off, unless the channel was toggled
    /// again since the request was made.
    ///
    /// # Errors
    /// Returns `PlaybackRejected` when the channel was rolled back.
    pub fn resolve_play(
        &mut self,
        channel: &str,
        ticket: u64,
        outcome: Result<(), PlayError>,
    ) -> EngineResult<()> {
        let Err(e) = outcome else {
            debug!(channel = %channel, ticket, "Playback started");
            return Ok(());
        };

        let current = self.tickets.get(channel) == Some(&ticket);
        let playing = self.mixer.channel(channel).is_some_and(|c| c.playing);
        if !current || !playing {
            debug!(channel = %channel, ticket, error = %e, "Ignoring stale playback failure");
            return Ok(());
        }

        warn!(channel = %channel, error = %e, "Playback rejected, turning channel off");
        self.mixer.stop_channel(channel)?;
        self.notify(Notification::ChannelPlayStateChanged { channel: channel.to_string(), playing: false });
        self.sync_any_playing();

        Err(Error::PlaybackRejected { channel: channel.to_string(), reason: e.to_string() }.into())
    }

    /// Builtin presets followed by custom presets.
    #[must_use]
    pub fn preset_summaries(&self) -> Vec<PresetSummary> {
        self.catalog
            .presets()
            .iter()
            .map(PresetSummary::from)
            .chain(self.presets.list_all().map(|(_, p)| PresetSummary::from(p)))
            .collect()
    }

    /// Snapshot of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            channels: self.mixer.channels().to_vec(),
            master_volume: self.mixer.master_volume(),
            any_playing: self.mixer.is_any_playing(),
            timer: self.timer.state(),
            active_preset: self.active_preset.clone(),
            presets: self.preset_summaries(),
        }
    }

    /// Silence the output before the session goes away.
    pub fn shutdown(&mut self) {
        let playing: Vec<String> =
            self.mixer.channels().iter().filter(|c| c.playing).map(|c| c.id.clone()).collect();
        for channel in &playing {
            self.output.pause(channel);
        }
        self.timer.stop();
        info!(paused = playing.len(), "Session shut down");
    }
}
