#[cfg(test)]
mod tests {
    use crate::locks::KeyedLocks;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_are_removed_after_release() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        {
            let _a = locks.acquire("a".to_string(), Duration::from_secs(1)).await.unwrap();
            let _b = locks.acquire("b".to_string(), Duration::from_secs(1)).await.unwrap();
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_second_acquire_times_out_while_held() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        let held = locks.acquire("k".to_string(), Duration::from_secs(1)).await.unwrap();

        let err = locks
            .acquire("k".to_string(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.key, "k");
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
        let _again = locks.acquire("k".to_string(), Duration::from_millis(20)).await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block_each_other() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        let _a = locks.acquire("a".to_string(), Duration::from_secs(1)).await.unwrap();
        let b = locks.acquire("b".to_string(), Duration::from_millis(20)).await;
        assert!(b.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_holders_are_mutually_exclusive() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("k".to_string(), Duration::from_secs(5)).await.unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }
}
