use drainloop_scheduler::{EventLoop, Scheduler, args, callback};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const PRODUCERS: usize = 4;
const TASKS_PER_PRODUCER: usize = 250;

#[test]
fn test_cross_thread_producers_are_never_lost() {
    let mut event_loop = EventLoop::new();
    let handle = event_loop.handle();
    let log = Arc::new(Mutex::new(Vec::new()));
    let start = Arc::new(Barrier::new(PRODUCERS + 1));
    let producers_done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let handle = handle.clone();
            let log = log.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                for i in 0..TASKS_PER_PRODUCER {
                    let log = log.clone();
                    handle
                        .schedule_immediate(
                            callback(move |_| {
                                log.lock().unwrap().push((producer, i));
                                Ok(())
                            }),
                            args![],
                        )
                        .unwrap();
                }
            })
        })
        .collect();

    let consumer = {
        let producers_done = producers_done.clone();
        let start = start.clone();
        thread::spawn(move || {
            start.wait();
            let deadline = Instant::now() + Duration::from_secs(10);
            loop {
                event_loop.process();
                // A task appended after the empty check stays queued for the
                // next pump, so one more pump after the producers finish
                // picks up any stragglers.
                if producers_done.load(Ordering::SeqCst) {
                    event_loop.process();
                    break;
                }
                assert!(Instant::now() < deadline, "consumer timed out");
                thread::yield_now();
            }
            event_loop
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    producers_done.store(true, Ordering::SeqCst);
    let event_loop = consumer.join().unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), PRODUCERS * TASKS_PER_PRODUCER);
    assert_eq!(event_loop.pending(), 0);

    // Each producer's tasks ran in the order that producer scheduled them.
    let mut last_seen: HashMap<usize, usize> = HashMap::new();
    for &(producer, i) in log.iter() {
        if let Some(&prev) = last_seen.get(&producer) {
            assert!(i > prev, "producer {producer} ran {i} after {prev}");
        }
        last_seen.insert(producer, i);
    }
    for producer in 0..PRODUCERS {
        assert_eq!(last_seen[&producer], TASKS_PER_PRODUCER - 1);
    }

    let stats = event_loop.stats();
    assert_eq!(stats.scheduled, (PRODUCERS * TASKS_PER_PRODUCER) as u64);
    assert_eq!(stats.executed, stats.scheduled);
}

#[test]
fn test_schedule_after_idle_pump_is_picked_up_next_time() {
    let mut event_loop = EventLoop::new();
    let handle = event_loop.handle();
    let ran = Arc::new(AtomicBool::new(false));

    assert_eq!(event_loop.process().executed, 0);

    {
        let ran = ran.clone();
        thread::spawn(move || {
            handle
                .schedule_immediate(
                    callback(move |_| {
                        ran.store(true, Ordering::SeqCst);
                        Ok(())
                    }),
                    args![],
                )
                .unwrap();
        })
        .join()
        .unwrap();
    }

    assert_eq!(event_loop.pending(), 1);
    assert_eq!(event_loop.process().executed, 1);
    assert!(ran.load(Ordering::SeqCst));
}
