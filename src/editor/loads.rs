//! Prototype mesh cache and in-flight loads
//!
//! Loads are polled cooperatively on the editor's thread with a no-op waker;
//! the render tick is what drives them forward. Dropping a pending load
//! abandons it.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;
use futures::FutureExt;

use crate::assets::{LoadFuture, PrototypeLoader, PrototypeMesh};
use crate::error::AssetLoadError;
use crate::store::PrototypeKind;

/// What a pending load is needed for once it resolves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadPurpose {
    /// Show the drag preview
    Ghost,
    /// Commit a drop at the snapped ground cell
    Drop { x: f32, z: f32 },
    /// Derive nodes for store records of this kind
    Derive,
}

pub type LoadResult = Result<Rc<PrototypeMesh>, AssetLoadError>;

/// A load that finished during [`MeshCache::poll`]
pub struct Resolved {
    pub kind: PrototypeKind,
    pub result: LoadResult,
    pub waiters: Vec<LoadPurpose>,
}

struct PendingLoad {
    kind: PrototypeKind,
    future: LoadFuture,
    waiters: Vec<LoadPurpose>,
}

#[derive(Default)]
pub struct MeshCache {
    meshes: HashMap<PrototypeKind, Rc<PrototypeMesh>>,
    pending: Vec<PendingLoad>,
    /// Kinds whose load failed while deriving; not retried for records
    failed: HashSet<PrototypeKind>,
}

fn poll_once(future: &mut LoadFuture) -> Poll<Result<PrototypeMesh, AssetLoadError>> {
    let mut cx = Context::from_waker(noop_waker_ref());
    future.poll_unpin(&mut cx)
}

impl MeshCache {
    pub fn get(&self, kind: PrototypeKind) -> Option<Rc<PrototypeMesh>> {
        self.meshes.get(&kind).cloned()
    }

    pub fn is_pending(&self, kind: PrototypeKind) -> bool {
        self.pending.iter().any(|load| load.kind == kind)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_failed(&self, kind: PrototypeKind) -> bool {
        self.failed.contains(&kind)
    }

    /// Returns the mesh if available now, otherwise registers `purpose` as a
    /// waiter on a (possibly new) load.
    ///
    /// A load that completes on its first poll is returned directly and
    /// never enters the pending list.
    pub fn request<L: PrototypeLoader + ?Sized>(
        &mut self,
        kind: PrototypeKind,
        purpose: LoadPurpose,
        loader: &L,
    ) -> Result<Option<Rc<PrototypeMesh>>, AssetLoadError> {
        if let Some(mesh) = self.get(kind) {
            return Ok(Some(mesh));
        }

        if let Some(load) = self.pending.iter_mut().find(|load| load.kind == kind) {
            let is_drop = matches!(purpose, LoadPurpose::Drop { .. });
            if is_drop || !load.waiters.contains(&purpose) {
                load.waiters.push(purpose);
            }
            return Ok(None);
        }

        let mut future = loader.load(kind);
        match poll_once(&mut future) {
            Poll::Ready(result) => self.settle(kind, result, &[purpose]).map(Some),
            Poll::Pending => {
                log::debug!("{} mesh is loading", kind);
                self.pending.push(PendingLoad {
                    kind,
                    future,
                    waiters: vec![purpose],
                });
                Ok(None)
            }
        }
    }

    /// Polls every pending load once
    pub fn poll(&mut self) -> Vec<Resolved> {
        let mut finished = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for mut load in self.pending.drain(..) {
            match poll_once(&mut load.future) {
                Poll::Ready(result) => finished.push((load.kind, result, load.waiters)),
                Poll::Pending => still_pending.push(load),
            }
        }
        self.pending = still_pending;

        finished
            .into_iter()
            .map(|(kind, result, waiters)| Resolved {
                kind,
                result: self.settle(kind, result, &waiters),
                waiters,
            })
            .collect()
    }

    fn settle(
        &mut self,
        kind: PrototypeKind,
        result: Result<PrototypeMesh, AssetLoadError>,
        waiters: &[LoadPurpose],
    ) -> LoadResult {
        match result {
            Ok(mesh) => {
                let mesh = Rc::new(mesh);
                self.failed.remove(&kind);
                self.meshes.insert(kind, Rc::clone(&mesh));
                Ok(mesh)
            }
            Err(err) => {
                if waiters.contains(&LoadPurpose::Derive) {
                    self.failed.insert(kind);
                }
                Err(err)
            }
        }
    }

    /// Drops every in-flight load; none of them will ever attach a node
    pub fn abandon_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        if count > 0 {
            log::debug!("abandoned {} pending loads", count);
        }
        count
    }
}
