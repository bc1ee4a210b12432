use super::*;
use crate::{weather_forecast::WeatherForecast, Event, RecordEditContext};
use assert_call::{call, CallRecorder};

#[test]
fn dropping_guard_detaches_event_handler() {
    let mut cr = CallRecorder::new();
    let e = Event::<str>::new();
    let s = e.subscribe(|name| call!("{name}"));
    e.emit("Date");
    cr.verify("Date");

    drop(s);
    e.emit("Summary");
    cr.verify(());
    assert_eq!(e.subscriber_count(), 0);
}

#[test]
fn guard_outliving_event_is_inert() {
    let mut cr = CallRecorder::new();
    let e = Event::<()>::new();
    let s = e.subscribe(|_| call!("emitted"));
    drop(e);
    drop(s);
    cr.verify(());
}

#[test]
fn guard_outliving_context_is_inert() {
    let ctx = RecordEditContext::with_record(WeatherForecast::default());
    let s = ctx.on_edit_state_updated(|_| {});
    drop(ctx);
    drop(s);
}

#[test]
fn empty_does_nothing_on_drop() {
    let mut cr = CallRecorder::new();
    {
        let _s = Subscription::empty();
    }
    cr.verify(());
}

#[test]
fn from_fn_runs_teardown_once() {
    let mut cr = CallRecorder::new();
    let s = Subscription::from_fn(|| call!("teardown"));
    cr.verify(());
    drop(s);
    cr.verify("teardown");
}

#[test]
fn subscriptions_release_all_on_drop() {
    let mut cr = CallRecorder::new();
    {
        let mut subs = Subscriptions::new();
        subs.push(Subscription::from_fn(|| call!("a")));
        subs.push(Subscription::from_fn(|| call!("b")));
        assert_eq!(subs.len(), 2);
        cr.verify(());
    }
    cr.verify(["a", "b"]);
}

#[test]
fn subscriptions_clear_releases_and_empties() {
    let mut cr = CallRecorder::new();
    let mut subs: Subscriptions = [Subscription::from_fn(|| call!("x"))].into_iter().collect();
    subs.clear();
    cr.verify("x");
    assert!(subs.is_empty());
    drop(subs);
    cr.verify(());
}
