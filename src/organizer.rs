use std::{collections::VecDeque, fmt::Debug};

use crate::{
    config::{ConfigProvider, CONFIG_GROUP},
    host::{ComponentId, WidgetHost},
    overlay::OverlayManager,
    slot::SKILLS_CONTAINER,
    task::{Trigger, TriggerQueue, TriggerSender},
};

/// Script the host runs whenever it recomputes the stats tab.
pub const SCRIPT_STATS_SKILLTOTAL: i32 = 396;

/// Entry point tying triggers, configuration and the overlay manager together.
///
/// Must live on the thread that owns the host UI. Other threads post
/// through [`SkillsOrganizer::sender`] and the work happens on the next
/// [`SkillsOrganizer::pump`].
pub struct SkillsOrganizer<P, Id> {
    provider: P,
    manager: OverlayManager<Id>,
    queue: TriggerQueue,
    pending: VecDeque<Trigger>,
    active: bool,
}

impl<P, Id> SkillsOrganizer<P, Id>
where
    P: ConfigProvider,
    Id: Copy + Eq + Debug,
{
    pub fn new(provider: P) -> Self {
        Self::with_container(provider, SKILLS_CONTAINER)
    }

    pub fn with_container(provider: P, container: ComponentId) -> Self {
        Self {
            provider,
            manager: OverlayManager::new(container),
            queue: TriggerQueue::new(),
            pending: VecDeque::new(),
            active: false,
        }
    }

    pub fn sender(&self) -> TriggerSender {
        self.queue.sender()
    }

    pub fn manager(&self) -> &OverlayManager<Id> {
        &self.manager
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Runs every trigger posted since the last call. Returns how many ran.
    pub fn pump<H>(&mut self, host: &mut H) -> usize
    where
        H: WidgetHost<Id = Id>,
    {
        self.queue.retrieve_pending(&mut self.pending);
        let count = self.pending.len();
        while let Some(trigger) = self.pending.pop_front() {
            self.handle(host, trigger);
        }
        count
    }

    pub fn handle<H>(&mut self, host: &mut H, trigger: Trigger)
    where
        H: WidgetHost<Id = Id>,
    {
        match trigger {
            Trigger::Activate => {
                self.active = true;
                if host.is_logged_in() {
                    self.update(host);
                }
            }
            Trigger::Deactivate => {
                if self.active {
                    log::info!("Restoring the default stats tab");
                }
                self.manager.teardown(host);
                self.active = false;
            }
            Trigger::ConfigChanged(event) => {
                if event.group != CONFIG_GROUP {
                    return;
                }
                log::debug!("Setting {} changed", event.key);
                self.update(host);
            }
            Trigger::ScriptPostFired { script_id } => self.on_script_post_fired(host, script_id),
        }
    }

    /// Called inline by the host, which already runs on the UI thread.
    pub fn on_script_post_fired<H>(&mut self, host: &mut H, script_id: i32)
    where
        H: WidgetHost<Id = Id>,
    {
        if script_id == SCRIPT_STATS_SKILLTOTAL {
            self.update(host);
        }
    }

    fn update<H>(&mut self, host: &mut H)
    where
        H: WidgetHost<Id = Id>,
    {
        if !self.active {
            return;
        }
        let config = self.provider.config();
        self.manager.reconcile(host, &config);
    }
}
