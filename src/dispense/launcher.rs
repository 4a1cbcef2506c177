//! Thread start-up, behind a trait so a pour can be run against a launcher
//! that refuses to start some units.

use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};

/// Starts the concurrent units of work a pour is made of.
pub trait TaskLauncher: Send + Sync {
    /// Start `task` inside `scope`.  The pour joins the handle before the
    /// scope ends.
    fn launch_scoped<'scope, 'env, F>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        task: F,
    ) -> io::Result<ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope;

    /// Start a detached task.
    fn launch<F>(&self, name: String, task: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static;
}

/// One named OS thread per unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLauncher;

impl TaskLauncher for ThreadLauncher {
    fn launch_scoped<'scope, 'env, F>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        task: F,
    ) -> io::Result<ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope,
    {
        thread::Builder::new().name(name).spawn_scoped(scope, task)
    }

    fn launch<F>(&self, name: String, task: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new().name(name).spawn(task).map(drop)
    }
}
