use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use stock_ledger::{ArticleId, Ledger, Operation, Quantity, RecordingSink, ShipmentId};
use tokio::runtime::Runtime;

/// Generates operation sequences for benchmarking.
///
/// Pattern per article (repeating):
/// 1. Withdraw 8 (comes up short once stock is gone)
/// 2. Withdraw 5
/// 3. Replenish 10 (settles the oldest reservations first)
pub struct OpGenerator {
    next_shipment: ShipmentId,
    num_articles: ArticleId,
    ops_per_article: u32,
    current_article: ArticleId,
    current_step: u32,
}

impl OpGenerator {
    pub fn new(num_articles: ArticleId, ops_per_article: u32) -> Self {
        Self {
            next_shipment: 1,
            num_articles,
            ops_per_article,
            current_article: 1,
            current_step: 0,
        }
    }
}

impl Iterator for OpGenerator {
    type Item = Operation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_article > self.num_articles {
            return None;
        }

        let article = self.current_article;
        let op = match self.current_step % 3 {
            0 | 1 => {
                let shipment = self.next_shipment;
                self.next_shipment += 1;
                let amount = if self.current_step % 3 == 0 { 8 } else { 5 };
                Operation::Withdraw {
                    article,
                    shipment,
                    amount: Quantity::new(amount),
                }
            }
            _ => Operation::Replenish {
                article,
                amount: Quantity::new(10),
            },
        };

        self.current_step += 1;
        if self.current_step >= self.ops_per_article {
            self.current_step = 0;
            self.current_article += 1;
        }

        Some(op)
    }
}

fn bench_sequential(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sequential");

    for count in [10_000u32, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                rt.block_on(async {
                    let ledger = Ledger::new(RecordingSink::new());
                    for op in OpGenerator::new(1, count) {
                        let _ = black_box(ledger.apply(op).await);
                    }
                    ledger
                })
            });
        });
    }

    group.finish();
}

fn bench_parallel_articles(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("parallel_articles");
    group.sample_size(20);

    for articles in [4u32, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(articles),
            &articles,
            |b, &articles| {
                b.iter(|| {
                    rt.block_on(async {
                        let ledger = Arc::new(Ledger::new(RecordingSink::new()));
                        let mut handles = Vec::new();
                        for article in 1..=articles {
                            let ledger = Arc::clone(&ledger);
                            handles.push(tokio::spawn(async move {
                                let ops = OpGenerator::new(1, 3_000).map(|op| match op {
                                    Operation::Withdraw {
                                        shipment, amount, ..
                                    } => Operation::Withdraw {
                                        article,
                                        shipment,
                                        amount,
                                    },
                                    Operation::Replenish { amount, .. } => {
                                        Operation::Replenish { article, amount }
                                    }
                                    other => other,
                                });
                                for op in ops {
                                    let _ = ledger.apply(op).await;
                                }
                            }));
                        }
                        for handle in handles {
                            handle.await.unwrap();
                        }
                        ledger
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sequential, bench_parallel_articles);
criterion_main!(benches);
