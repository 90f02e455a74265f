use crate::api::RequestParameters;
use crate::manager::RewardedAdManager;
use rewarded_core::{AdUnitId, Reward, RewardedError};
use std::collections::BTreeSet;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum ManagerCommand {
    LoadAd { ad_unit_id: AdUnitId, params: RequestParameters },
    ShowAd {
        ad_unit_id: AdUnitId,
        custom_data: Option<String>,
        reply: oneshot::Sender<Result<(), RewardedError>>,
    },
    SelectReward { ad_unit_id: AdUnitId, reward: Reward, reply: oneshot::Sender<bool> },
    HasAd { ad_unit_id: AdUnitId, reply: oneshot::Sender<bool> },
    AvailableRewards { ad_unit_id: AdUnitId, reply: oneshot::Sender<BTreeSet<Reward>> },
    SelectedReward { ad_unit_id: AdUnitId, reply: oneshot::Sender<Option<Reward>> },
    Reset,
    Shutdown,
}

/// Cloneable, `Send` front for a manager running on a `LocalSet`.
#[derive(Clone, Debug)]
pub struct ManagerHandle {
    commands: mpsc::UnboundedSender<ManagerCommand>,
}

impl std::fmt::Debug for ManagerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LoadAd { .. } => "LoadAd",
            Self::ShowAd { .. } => "ShowAd",
            Self::SelectReward { .. } => "SelectReward",
            Self::HasAd { .. } => "HasAd",
            Self::AvailableRewards { .. } => "AvailableRewards",
            Self::SelectedReward { .. } => "SelectedReward",
            Self::Reset => "Reset",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl ManagerHandle {
    pub fn load_ad(&self, ad_unit_id: AdUnitId, params: RequestParameters) -> bool {
        self.send(ManagerCommand::LoadAd { ad_unit_id, params })
    }

    pub async fn show_ad(
        &self,
        ad_unit_id: AdUnitId,
        custom_data: Option<String>,
    ) -> Result<(), RewardedError> {
        let (reply, rx) = oneshot::channel();
        if !self.send(ManagerCommand::ShowAd { ad_unit_id, custom_data, reply }) {
            return Err(RewardedError::ManagerStopped);
        }
        rx.await.unwrap_or(Err(RewardedError::ManagerStopped))
    }

    pub async fn select_reward(
        &self,
        ad_unit_id: AdUnitId,
        reward: Reward,
    ) -> Result<bool, RewardedError> {
        let (reply, rx) = oneshot::channel();
        self.request(ManagerCommand::SelectReward { ad_unit_id, reward, reply }, rx).await
    }

    pub async fn has_ad(&self, ad_unit_id: AdUnitId) -> Result<bool, RewardedError> {
        let (reply, rx) = oneshot::channel();
        self.request(ManagerCommand::HasAd { ad_unit_id, reply }, rx).await
    }

    pub async fn available_rewards(
        &self,
        ad_unit_id: AdUnitId,
    ) -> Result<BTreeSet<Reward>, RewardedError> {
        let (reply, rx) = oneshot::channel();
        self.request(ManagerCommand::AvailableRewards { ad_unit_id, reply }, rx).await
    }

    pub async fn selected_reward(
        &self,
        ad_unit_id: AdUnitId,
    ) -> Result<Option<Reward>, RewardedError> {
        let (reply, rx) = oneshot::channel();
        self.request(ManagerCommand::SelectedReward { ad_unit_id, reply }, rx).await
    }

    pub fn reset(&self) -> bool {
        self.send(ManagerCommand::Reset)
    }

    pub fn shutdown(&self) -> bool {
        self.send(ManagerCommand::Shutdown)
    }

    fn send(&self, command: ManagerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    async fn request<T>(
        &self,
        command: ManagerCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, RewardedError> {
        if !self.send(command) {
            return Err(RewardedError::ManagerStopped);
        }
        rx.await.map_err(|_| RewardedError::ManagerStopped)
    }
}

/// Moves the manager onto the current `LocalSet`. The task ends on `shutdown`
/// or once every handle is dropped, invalidating whatever adapters remain.
pub fn spawn_manager(manager: RewardedAdManager) -> (ManagerHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let task = tokio::task::spawn_local(run_manager(manager, rx));
    (ManagerHandle { commands }, task)
}

async fn run_manager(
    mut manager: RewardedAdManager,
    mut commands: mpsc::UnboundedReceiver<ManagerCommand>,
) {
    let wake = manager.wake_handle();
    log::debug!("rewarded ad manager task started");
    loop {
        manager.process_pending_events();
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(ManagerCommand::Shutdown) => break,
                Some(command) => apply(&mut manager, command),
            },
            _ = wake.notified() => {}
        }
    }
    manager.process_pending_events();
    manager.reset();
    log::debug!("rewarded ad manager task stopped");
}

fn apply(manager: &mut RewardedAdManager, command: ManagerCommand) {
    log::trace!("manager command {command:?}");
    match command {
        ManagerCommand::LoadAd { ad_unit_id, params } => manager.load_ad(ad_unit_id, params),
        ManagerCommand::ShowAd { ad_unit_id, custom_data, reply } => {
            let _ = reply.send(manager.show_ad(&ad_unit_id, custom_data));
        }
        ManagerCommand::SelectReward { ad_unit_id, reward, reply } => {
            let _ = reply.send(manager.select_reward(&ad_unit_id, &reward));
        }
        ManagerCommand::HasAd { ad_unit_id, reply } => {
            manager.process_pending_events();
            let _ = reply.send(manager.has_ad(&ad_unit_id));
        }
        ManagerCommand::AvailableRewards { ad_unit_id, reply } => {
            manager.process_pending_events();
            let _ = reply.send(manager.available_rewards(&ad_unit_id));
        }
        ManagerCommand::SelectedReward { ad_unit_id, reply } => {
            manager.process_pending_events();
            let _ = reply.send(manager.selected_reward(&ad_unit_id).cloned());
        }
        ManagerCommand::Reset => manager.reset(),
        ManagerCommand::Shutdown => {}
    }
}
