mod test_helpers;

use std::collections::HashMap;

use switchyard::{bounded, fan_in, fan_in_with, Receiver, SetupError};
use test_helpers::{wait_for, within};

#[tokio::test]
async fn test_no_inputs_closes_immediately() {
    let output = fan_in(Vec::<Receiver<u32>>::new()).unwrap();
    assert_eq!(within(output.recv()).await, None);
    assert!(output.is_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_stream_order_is_preserved() {
    let mut inputs = Vec::new();
    for stream in 0..4u32 {
        let (tx, rx) = bounded(2);
        inputs.push(rx);
        tokio::spawn(async move {
            for seq in 0..25u32 {
                tx.send((stream, seq)).await.unwrap();
            }
            tx.close();
        });
    }

    let merged = within(fan_in(inputs).unwrap().drain()).await;
    assert_eq!(merged.len(), 100);

    let mut last: HashMap<u32, u32> = HashMap::new();
    for (stream, seq) in merged {
        if let Some(prev) = last.insert(stream, seq) {
            assert!(seq > prev, "stream {stream} reordered: {prev} then {seq}");
        }
    }
    assert!(last.values().all(|seq| *seq == 24));
}

#[tokio::test]
async fn test_already_closed_input() {
    let (closed_tx, closed_rx) = bounded::<&str>(1);
    closed_tx.close();

    let (open_tx, open_rx) = bounded(2);
    open_tx.send("a").await.unwrap();
    open_tx.send("b").await.unwrap();
    open_tx.close();

    let output = fan_in([closed_rx, open_rx]).unwrap();
    assert_eq!(within(output.drain()).await, vec!["a", "b"]);
}

#[tokio::test]
async fn test_output_stays_open_until_every_input_ends() {
    let (first_tx, first_rx) = bounded(1);
    let (second_tx, second_rx) = bounded(1);
    let output = fan_in_with([first_rx, second_rx], 4).unwrap();
    assert_eq!(output.capacity(), 4);

    first_tx.send(1).await.unwrap();
    first_tx.close();
    assert_eq!(within(output.recv()).await, Some(1));

    wait_for(20).await;
    assert!(!output.is_closed());

    second_tx.send(2).await.unwrap();
    drop(second_tx);
    assert_eq!(within(output.drain()).await, vec![2]);
}

#[tokio::test]
async fn test_dropped_output_stops_forwarders() {
    let (tx, rx) = bounded(1);
    let output = fan_in([rx]).unwrap();
    drop(output);

    // The forwarder exits after failing to hand over one value and drops
    // its input, which this sender then observes.
    tx.send(1).await.unwrap();
    within(async {
        while !tx.is_disconnected() {
            wait_for(5).await;
        }
    })
    .await;
    assert!(tx.send(2).await.is_err());
}

#[test]
fn test_fan_in_without_runtime() {
    let (_tx, rx) = bounded::<u32>(1);
    assert_eq!(fan_in([rx]).err(), Some(SetupError::NoRuntime));
}
