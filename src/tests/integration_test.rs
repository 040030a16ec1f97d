use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use crate::config::Settings;
use crate::queue::{
    Admin, Backoff, ConsumeOptions, Consumer, Harvester, Payload, Producer, QueueKind, Topic,
};
use crate::store::{RemoteStore, SledStore, Store};
use crate::transport::{bind, serve};

async fn connect(settings: &Settings) -> Arc<dyn Store> {
    Arc::new(
        RemoteStore::connect(&settings.store.host, settings.store.port)
            .await
            .expect("client connect"),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn integration_work_queue_end_to_end() {
    let dir = tempdir().unwrap();
    let backend = SledStore::open(dir.path().to_str().unwrap()).unwrap();

    let listener = bind("127.0.0.1:0").await.unwrap();
    let mut settings = Settings::default();
    settings.store.host = "127.0.0.1".to_string();
    settings.store.port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve(listener, Arc::new(backend.clone())));

    let topic = Topic::new("tiles").unwrap();
    let producer = Producer::new(connect(&settings).await);
    let mut published = Vec::new();
    for i in 0..30 {
        let payload = Payload::from_json_str(&format!(r#"{{"tile": "T{i}", "band": 4}}"#)).unwrap();
        published.push(producer.publish(&topic, payload).await.unwrap());
    }

    // a worker that takes a message and dies before committing
    {
        let crashed = Consumer::new(connect(&settings).await);
        let lost = crashed
            .consume(&topic, ConsumeOptions::no_wait())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lost.id, published[0]);
    }

    let admin = Admin::new(connect(&settings).await);
    assert_eq!(admin.list_queue(&topic, QueueKind::Nextlog).await.unwrap(), vec![published[0].clone()]);
    assert_eq!(
        Harvester::new(connect(&settings).await).harvest(&topic).await.unwrap(),
        1
    );

    let mut workers = Vec::new();
    for _ in 0..3 {
        let consumer = Consumer::new(connect(&settings).await).with_backoff(Backoff::from(&settings.consumer));
        let topic = topic.clone();
        workers.push(tokio::spawn(async move {
            let mut done = Vec::new();
            while let Some(message) = consumer
                .consume(&topic, ConsumeOptions::with_timeout(Duration::from_millis(200)))
                .await
                .unwrap()
            {
                assert!(consumer.commit(&topic, &message.id).await.unwrap());
                done.push(message.id);
            }
            done
        }));
    }

    let mut processed = Vec::new();
    for worker in workers {
        processed.extend(worker.await.unwrap());
    }
    assert_eq!(processed.len(), published.len());
    let unique: HashSet<_> = processed.iter().collect();
    assert_eq!(unique, published.iter().collect::<HashSet<_>>());

    let info = admin.info(&topic).await.unwrap();
    assert_eq!((info.backlog_depth, info.nextlog_depth), (0, 0));
    assert!(admin.list_topics().await.unwrap().is_empty());

    // everything went through the server to the shared sled tree
    assert!(backend.keys().await.unwrap().is_empty());
    server.abort();
}
