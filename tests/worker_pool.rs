use serde_json::json;
use vision_bridge_lib::commands::Request;
use vision_bridge_lib::{Arg, BridgeConfig, BridgeError, ObjectKind, WorkerPool};

fn pool(workers: usize) -> WorkerPool {
    WorkerPool::new(BridgeConfig {
        workers,
        ..BridgeConfig::default()
    })
}

#[tokio::test]
async fn invoke_runs_on_the_shared_bridge() {
    let pool = pool(2);
    let outcome = pool
        .invoke("zeros", vec![Arg::from(2), Arg::from(3), Arg::from(0)])
        .await
        .unwrap();
    let mat = outcome.wrapped().unwrap().clone();
    assert_eq!(mat.kind, ObjectKind::Mat);

    let data = pool.run(move |bridge| bridge.mat_data(&mat)).await.unwrap();
    assert_eq!(data.data.len(), 6);
    assert_eq!(pool.available_permits(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_each_get_their_own_handle() {
    let pool = pool(3);
    let mut tasks = Vec::new();
    for i in 0..16 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            pool.run(move |bridge| bridge.frame_buffer_to_mat(1, 1, 1, &[i as u8])).await
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    let live = pool.run(|bridge| Ok(bridge.store().len())).await.unwrap();
    assert_eq!(live, 16);
}

#[tokio::test]
async fn clear_through_the_pool_invalidates_handles() {
    let pool = pool(1);
    let created = pool
        .execute(serde_json::from_value::<Request>(json!({"op": "createObject", "object": {"type": "point", "x": 1, "y": 2}})).unwrap())
        .await
        .unwrap();
    pool.execute(Request::ClearBuffers).await.unwrap();

    let stale: Request = serde_json::from_value(json!({"op": "toValue", "value": created})).unwrap();
    let err = pool.execute(stale).await.unwrap_err();
    assert!(matches!(err, BridgeError::Lookup(_)));
}

#[tokio::test]
async fn panicking_call_surfaces_as_worker_error() {
    let pool = pool(1);
    let err = pool
        .run(|_| -> Result<(), BridgeError> { panic!("boom") })
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Worker(_)));
}
