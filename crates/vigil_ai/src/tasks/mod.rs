//! Cooperative task primitives.
//!
//! Задачи подсистем это обычные resumable значения. `step(dt)` контроллера
//! двигает их; `Poll::Pending` = задача ждёт, `Poll::Ready` = закончила.
//! У каждого режима подсистемы свой `TaskSlot`.

use std::time::Duration;

use bevy::prelude::*;

/// Outcome of advancing a task once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Ready,
}

/// At most one outstanding task per mode.
///
/// `start` ничего не делает, пока задача активна; `stop` очищает слот
/// безусловно, можно вызывать сколько угодно раз.
#[derive(Debug)]
pub struct TaskSlot<T> {
    name: &'static str,
    task: Option<T>,
}

impl<T> TaskSlot<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, task: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Installs the task built by `make` if the slot is free.
    /// Returns the freshly installed task, `None` if one was already outstanding.
    pub fn start(&mut self, make: impl FnOnce() -> T) -> Option<&mut T> {
        if self.task.is_some() {
            return None;
        }
        crate::log(&format!("task '{}' started", self.name));
        Some(self.task.insert(make()))
    }

    /// Returns true if a task was cancelled.
    pub fn stop(&mut self) -> bool {
        let cancelled = self.task.take().is_some();
        if cancelled {
            crate::log(&format!("task '{}' cancelled", self.name));
        }
        cancelled
    }

    pub fn get(&self) -> Option<&T> {
        self.task.as_ref()
    }

    /// Двигает задачу через `resume`; слот очищается сам, когда задача
    /// вернула `Ready`.
    pub fn advance(&mut self, resume: impl FnOnce(&mut T) -> Poll) -> Option<Poll> {
        let task = self.task.as_mut()?;
        let poll = resume(task);
        if poll == Poll::Ready {
            self.task = None;
            crate::log(&format!("task '{}' finished", self.name));
        }
        Some(poll)
    }
}

/// Fixed-interval suspension point.
#[derive(Debug, Clone)]
pub struct Wait {
    timer: Timer,
}

impl Wait {
    pub fn seconds(seconds: f32) -> Self {
        Self {
            timer: Timer::from_seconds(seconds.max(0.0), TimerMode::Once),
        }
    }

    /// Elapses on the next tick, whatever its delta.
    pub fn ready() -> Self {
        Self::seconds(0.0)
    }

    /// Returns true once the interval has fully elapsed.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer.tick(Duration::from_secs_f32(dt.max(0.0)));
        self.timer.finished()
    }

    pub fn remaining_secs(&self) -> f32 {
        self.timer.remaining_secs()
    }
}

/// Пропускает каждый n-й sample, начиная с первого.
#[derive(Debug, Clone)]
pub struct SampleDivider {
    every: u32,
    counter: u32,
}

impl SampleDivider {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            counter: 0,
        }
    }

    pub fn should_sample(&mut self) -> bool {
        let sample = self.counter == 0;
        self.counter = (self.counter + 1) % self.every;
        sample
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
