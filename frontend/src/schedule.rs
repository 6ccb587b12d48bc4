use std::collections::BTreeMap;

/// Handle for a scheduled task, usable to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Scroll-driven updates that are throttled independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Progress,
    Header,
    BackToTop,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Task {
    /// Splash delay elapsed: start the splash exit.
    HideSplash,
    /// Splash exit finished: unlock scrolling and queue the section fades.
    RevealSections,
    /// Fade in the section at this position of the reveal order.
    FadeInSection(usize),
    /// Scroll to an in-page target after the mobile menu has closed.
    DeferredScroll(String),
    ReleaseThrottle(Channel),
}

/// What the host must do with its real timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerRequest {
    Arm { id: TaskId, delay_ms: u32 },
    Cancel(TaskId),
}

/// Keeps delayed work as plain data so time can be driven by a browser
/// timeout or by a test clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: BTreeMap<TaskId, Task>,
    requests: Vec<TimerRequest>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: Task, delay_ms: u32) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.pending.insert(id, task);
        self.requests.push(TimerRequest::Arm { id, delay_ms });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        if self.pending.remove(&id).is_some() {
            self.requests.push(TimerRequest::Cancel(id));
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let ids: Vec<TaskId> = self.pending.keys().copied().collect();
        for id in &ids {
            self.cancel(*id);
        }
        ids.len()
    }

    /// Claims the task for a timer that went off. Cancelled or already fired
    /// ids yield nothing.
    pub fn fire(&mut self, id: TaskId) -> Option<Task> {
        self.pending.remove(&id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn drain_requests(&mut self) -> Vec<TimerRequest> {
        std::mem::take(&mut self.requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_arms_a_timer() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(Task::HideSplash, 2500);
        assert_eq!(scheduler.drain_requests(), vec![TimerRequest::Arm { id, delay_ms: 2500 }]);
        assert_eq!(scheduler.fire(id), Some(Task::HideSplash));
        assert_eq!(scheduler.fire(id), None);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(Task::DeferredScroll("#contact".into()), 50);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.fire(id), None);
        assert_eq!(
            scheduler.drain_requests(),
            vec![TimerRequest::Arm { id, delay_ms: 50 }, TimerRequest::Cancel(id)]
        );
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::HideSplash, 10);
        scheduler.schedule(Task::FadeInSection(0), 20);
        assert_eq!(scheduler.cancel_all(), 2);
        assert_eq!(scheduler.pending_len(), 0);
    }
}
