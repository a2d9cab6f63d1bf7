//! Request tickets.
//!
//! Every request whose answer lands in view state is tagged with a ticket.
//! Tickets are unique for the life of the process and strictly increasing,
//! so a view can recognise an answer to anything but its latest request,
//! even one issued by an earlier instance of the same view.

use std::sync::atomic::{AtomicU64, Ordering};

pub type Ticket = u64;

static NEXT: AtomicU64 = AtomicU64::new(1);

pub fn issue() -> Ticket { NEXT.fetch_add(1, Ordering::Relaxed) }
