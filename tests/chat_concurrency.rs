mod common;

use common::file_harness;
use matchmaking_core::domain::entities::SendMessageCommand;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_never_overspend_the_last_slot() {
    let (h, _db_dir) = file_harness(8).await;
    let sender = h.register("Sender").await;
    let single = h.plan("Single", Some(1), false).await;
    h.subscribe(&sender, &single).await;

    let mut partners = Vec::new();
    for index in 0..8 {
        let partner = h.register(&format!("Partner{index}")).await;
        h.connect(&sender, &partner).await;
        partners.push(partner);
    }

    let handles: Vec<_> = partners
        .iter()
        .map(|partner| {
            let chat = h.state.chat_service.clone();
            let command = SendMessageCommand::new(sender.id, partner.id, "hi");
            tokio::spawn(async move { chat.send_message(command).await })
        })
        .collect();

    let mut delivered = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => delivered += 1,
            Err(err) => assert_eq!(err.to_string(), "Forbidden: Chat limit reached"),
        }
    }
    assert_eq!(delivered, 1);

    let current = h
        .state
        .subscription_ledger
        .current_subscription(sender.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.used_chat_slots, 1);
    assert_eq!(
        h.state.chat_service.get_messages_for_user(sender.id).await.unwrap().len(),
        1
    );
}
