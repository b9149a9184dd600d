mod component;
mod config;
mod html;
mod state;
mod view;

pub use self::{
    component::{DEFAULT_FETCH_TIMEOUT, DetailPage},
    config::{DisplaySpec, PageConfig},
    html::escape,
    state::{Phase, Ticket, ViewState},
    view::{DetailView, Image, MetaField, OutboundLink, View, calendar_date, render},
};
