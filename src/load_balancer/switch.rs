//! Active picker holder.
//!
//! # Responsibilities
//! - Rebuild the picker on every ready-set change
//! - Swap in a new builder when picker options change
//! - Publish pickers with an atomic pointer swap
//! - Serve picks from whichever picker is current
//!
//! In-flight calls keep their backend alive through the completion handle,
//! so a superseded picker never cancels outstanding work.

use std::marker::PhantomData;
use std::sync::Arc;
use arc_swap::ArcSwap;
use crate::load_balancer::builder::{PickerBuilder, WrrPickerBuilder};
use crate::load_balancer::error::PickError;
use crate::load_balancer::metadata::{CallContext, ReadyConn};
use crate::load_balancer::picker::{PickResult, Picker};

/// Keeps the current picker in sync with the runtime's ready set.
pub struct Balancer<C, B = WrrPickerBuilder>
where
    B: PickerBuilder<C>,
{
    builder: ArcSwap<B>,
    current: ArcSwap<B::Picker>,
    _conn: PhantomData<fn(C)>,
}

impl<C, B> Balancer<C, B>
where
    B: PickerBuilder<C>,
{
    /// Start with a picker over an empty ready set.
    pub fn new(builder: B) -> Self {
        let initial = builder.build(Vec::new());
        Self {
            builder: ArcSwap::from_pointee(builder),
            current: ArcSwap::from_pointee(initial),
            _conn: PhantomData,
        }
    }

    /// Replace the picker with one built from `ready`.
    pub fn update(&self, ready: Vec<ReadyConn<C>>) {
        let picker = self.builder.load().build(ready);
        self.current.store(Arc::new(picker));
    }

    /// Install `builder` and rebuild from `ready` with it.
    ///
    /// Concurrent `update` calls may still build with the previous builder;
    /// callers serialise reconfiguration with ready-set changes.
    pub fn reconfigure(&self, builder: B, ready: Vec<ReadyConn<C>>) {
        let builder = Arc::new(builder);
        let picker = builder.build(ready);
        self.builder.store(builder);
        self.current.store(Arc::new(picker));
    }

    /// The picker new calls are served from.
    pub fn picker(&self) -> Arc<B::Picker> {
        self.current.load_full()
    }

    /// The builder used by the next `update`.
    pub fn builder(&self) -> Arc<B> {
        self.builder.load_full()
    }

    pub fn pick(&self, ctx: &CallContext) -> Result<PickResult<C>, PickError> {
        self.current.load().pick(ctx)
    }
}
