// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Synchronous publish/subscribe for game transitions.
//!
//! Every transition the game goes through is announced on one of a fixed set
//! of channels. Handlers run in registration order on the emitter's call
//! stack, and a handler may emit further events; those nested emissions run
//! to completion before the outer emission moves on to its next handler.
//!
//! Handlers receive the context that owns the bus (for the engine, the
//! `Game`), which is how the game's own rules are wired: they are handlers on
//! `move-finished` like any other.
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use hashbrown::HashMap;

use crate::cell::Cell;
use crate::error::ChannelParseError;
use crate::piece::Piece;
use crate::types::{PieceKind, Team};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Move,
    MoveFinished,
    Capture,
    Check,
    Checkmate,
    Stalemate,
    Promotion,
    PromotionAvailable,
}

pub static CHANNELS: [Channel; 8] = [
    Channel::Move,
    Channel::MoveFinished,
    Channel::Capture,
    Channel::Check,
    Channel::Checkmate,
    Channel::Stalemate,
    Channel::Promotion,
    Channel::PromotionAvailable,
];

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Move => "move",
            Channel::MoveFinished => "move-finished",
            Channel::Capture => "capture",
            Channel::Check => "check",
            Channel::Checkmate => "checkmate",
            Channel::Stalemate => "stalemate",
            Channel::Promotion => "promotion",
            Channel::PromotionAvailable => "promotion-available",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = ChannelParseError;

    fn from_str(s: &str) -> Result<Channel, ChannelParseError> {
        CHANNELS
            .iter()
            .copied()
            .find(|channel| channel.name() == s)
            .ok_or_else(|| ChannelParseError(s.to_owned()))
    }
}

/// A transition of the game, together with the data that describes it. The
/// channel an event is delivered on is determined by its variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum Event {
    /// A move has been accepted and is about to be applied.
    Move { team: Team, from: Cell, to: Cell },

    /// A move has been applied and the turn has passed.
    MoveFinished { team: Team, from: Cell, to: Cell },

    /// `piece` was taken on `cell` by `team`.
    Capture { piece: Piece, team: Team, cell: Cell },

    /// `team` is in check.
    Check { team: Team },

    /// The game is over and `team` won it.
    Checkmate { team: Team },

    Stalemate,

    Promotion {
        team: Team,
        cell: Cell,
        kind: PieceKind,
    },

    /// The pawn on `cell` has reached the far rank and must be promoted.
    PromotionAvailable { team: Team, cell: Cell },
}

impl Event {
    pub fn channel(&self) -> Channel {
        match self {
            Event::Move { .. } => Channel::Move,
            Event::MoveFinished { .. } => Channel::MoveFinished,
            Event::Capture { .. } => Channel::Capture,
            Event::Check { .. } => Channel::Check,
            Event::Checkmate { .. } => Channel::Checkmate,
            Event::Stalemate => Channel::Stalemate,
            Event::Promotion { .. } => Channel::Promotion,
            Event::PromotionAvailable { .. } => Channel::PromotionAvailable,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.channel())?;
        match self {
            Event::Move { team, from, to } | Event::MoveFinished { team, from, to } => {
                write!(f, " {} {} -> {}", team, from, to)
            }
            Event::Capture { piece, team, cell } => {
                write!(f, " {} takes {} on {}", team, piece, cell)
            }
            Event::Check { team } => write!(f, " {}", team),
            Event::Checkmate { team } => write!(f, " {} wins", team),
            Event::Stalemate => Ok(()),
            Event::Promotion { team, cell, kind } => write!(f, " {} {} on {}", team, kind, cell),
            Event::PromotionAvailable { team, cell } => write!(f, " {} on {}", team, cell),
        }
    }
}

pub type Handler<C> = Rc<dyn Fn(&mut C, &Event)>;

/// Returned by `subscribe`; the only way to refer to a handler afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscription<C> {
    id: SubscriptionId,
    once: bool,
    // Pinned handlers implement the rules themselves and survive `clear`.
    pinned: bool,
    handler: Handler<C>,
}

pub struct EventBus<C> {
    next_id: u64,
    channels: HashMap<Channel, Vec<Subscription<C>>>,
}

impl<C> EventBus<C> {
    pub fn new() -> EventBus<C> {
        EventBus {
            next_id: 0,
            channels: HashMap::new(),
        }
    }

    pub fn subscribe<F>(&mut self, channel: Channel, handler: F) -> SubscriptionId
    where
        F: Fn(&mut C, &Event) + 'static,
    {
        self.insert(channel, false, false, Rc::new(handler))
    }

    /// Like `subscribe`, but the handler is removed before its first run.
    pub fn subscribe_once<F>(&mut self, channel: Channel, handler: F) -> SubscriptionId
    where
        F: Fn(&mut C, &Event) + 'static,
    {
        self.insert(channel, true, false, Rc::new(handler))
    }

    pub(crate) fn subscribe_pinned<F>(&mut self, channel: Channel, handler: F) -> SubscriptionId
    where
        F: Fn(&mut C, &Event) + 'static,
    {
        self.insert(channel, false, true, Rc::new(handler))
    }

    fn insert(
        &mut self,
        channel: Channel,
        once: bool,
        pinned: bool,
        handler: Handler<C>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.channels
            .entry(channel)
            .or_insert_with(Vec::new)
            .push(Subscription {
                id,
                once,
                pinned,
                handler,
            });
        id
    }

    /// Removes a handler. Returns whether it was still registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subs in self.channels.values_mut() {
            if let Some(idx) = subs.iter().position(|sub| sub.id == id) {
                subs.remove(idx);
                return true;
            }
        }

        false
    }

    /// Removes every handler registered on `channel`, or on every channel if
    /// none is given. Pinned handlers are kept.
    pub fn clear(&mut self, channel: Option<Channel>) {
        match channel {
            Some(channel) => {
                if let Some(subs) = self.channels.get_mut(&channel) {
                    subs.retain(|sub| sub.pinned);
                }
            }
            None => {
                for subs in self.channels.values_mut() {
                    subs.retain(|sub| sub.pinned);
                }
            }
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.channels
            .values()
            .any(|subs| subs.iter().any(|sub| sub.id == id))
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.channels.get(&channel).map_or(0, Vec::len)
    }

    fn pending(&self, channel: Channel) -> Vec<(SubscriptionId, Handler<C>)> {
        self.channels.get(&channel).map_or_else(Vec::new, |subs| {
            subs.iter()
                .map(|sub| (sub.id, Rc::clone(&sub.handler)))
                .collect()
        })
    }

    // Confirms a pending handler is still registered right before it runs,
    // retiring it first if it only wanted one event.
    fn claim(&mut self, channel: Channel, id: SubscriptionId) -> bool {
        let subs = match self.channels.get_mut(&channel) {
            Some(subs) => subs,
            None => return false,
        };

        match subs.iter().position(|sub| sub.id == id) {
            Some(idx) => {
                if subs[idx].once {
                    subs.remove(idx);
                }
                true
            }
            None => false,
        }
    }
}

impl<C> Default for EventBus<C> {
    fn default() -> EventBus<C> {
        EventBus::new()
    }
}

impl<C> fmt::Debug for EventBus<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        for &channel in &CHANNELS {
            let count = self.listener_count(channel);
            if count != 0 {
                map.entry(&channel, &count);
            }
        }
        map.finish()
    }
}

/// Anything that owns an `EventBus` addressed to itself.
pub trait Observable: Sized {
    fn event_bus(&mut self) -> &mut EventBus<Self>;
}

/// Delivers `event` to the handlers registered on its channel at the time of
/// the call, in registration order. Handlers added during delivery wait for
/// the next event; handlers removed during delivery are skipped.
pub fn emit<C: Observable>(ctx: &mut C, event: Event) {
    let channel = event.channel();
    let pending = ctx.event_bus().pending(channel);
    for (id, handler) in pending {
        if !ctx.event_bus().claim(channel, id) {
            continue;
        }

        (*handler)(ctx, &event);
    }
}
