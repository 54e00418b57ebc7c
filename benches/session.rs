use std::collections::{BTreeMap, VecDeque};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use elicit::{
    Answer, AnswerOption, AnswerSource, AttrValue, CatalogObject, ElicitResult, KnowledgeBase,
    ProductionRule, Question, QuestionId, QuestionKind, Rule, RuleId, Session,
};

struct ScriptedAnswers {
    answers: VecDeque<Answer>,
}

impl AnswerSource for ScriptedAnswers {
    fn answer(&mut self, _id: QuestionId, _question: &Question) -> ElicitResult<Answer> {
        Ok(self.answers.pop_front().expect("script covers the flow"))
    }
}

/// Knowledge base with a question chain, flow rules, a production pass,
/// and a catalog sized so the filter measures realistic work.
fn make_knowledge_base() -> KnowledgeBase {
    let mut questions = BTreeMap::new();
    questions.insert(
        QuestionId(1),
        Question::new("Purpose?", QuestionKind::SingleChoice)
            .with_attribute("purpose")
            .with_options(vec![
                AnswerOption::new("office"),
                AnswerOption::new("gaming").with_implied("priority", "responsiveness"),
            ])
            .with_next(2u32),
    );
    questions.insert(
        QuestionId(2),
        Question::new("Budget?", QuestionKind::NumericEntry { maximum: true })
            .with_attribute("price")
            .with_next(3u32),
    );
    questions.insert(
        QuestionId(3),
        Question::new("Wireless?", QuestionKind::YesNo).with_attribute("wireless"),
    );
    questions.insert(
        QuestionId(4),
        Question::new("Devices?", QuestionKind::NumericEntry { maximum: false })
            .with_attribute("device_count"),
    );

    let mut rules = BTreeMap::new();
    rules.insert(
        RuleId(1),
        Rule::new().when("wireless", AttrValue::Bool(true)).includes([4]),
    );

    let production = vec![ProductionRule::new("pairing-needs-radio")
        .premise_on("device_count", AttrValue::at_least(2.0))
        .derives("bluetooth", AttrValue::Bool(true))];

    // 256 objects with prices from 10 to 1285 in steps of 5.
    let objects = (0..256u32)
        .map(|i| {
            CatalogObject::new(format!("kb-{i}"))
                .with_attribute("price", f64::from(10 + i * 5))
                .with_attribute("wireless", i % 2 == 0)
                .with_attribute("device_count", f64::from(1 + i % 4))
        })
        .collect();

    KnowledgeBase::new(questions, objects, rules, production)
}

fn script() -> ScriptedAnswers {
    ScriptedAnswers {
        answers: VecDeque::from(vec![
            Answer::Selection(vec![1]),
            Answer::Number(500.0),
            Answer::YesNo(true),
            Answer::Number(2.0),
        ]),
    }
}

fn bench_full_session(c: &mut Criterion) {
    let kb = make_knowledge_base();
    let mut group = c.benchmark_group("session");
    group.throughput(Throughput::Elements(1));
    group.bench_function("full_run", |b| {
        b.iter(|| {
            let session = Session::new(kb.clone()).unwrap();
            let mut source = script();
            session.run(&mut source).unwrap()
        });
    });
    group.finish();
}

fn bench_filter_only(c: &mut Criterion) {
    let kb = make_knowledge_base();
    let mut session = Session::new(kb).unwrap();
    session.submit(&Answer::Selection(vec![1])).unwrap();
    session.submit(&Answer::Number(500.0)).unwrap();
    session.submit(&Answer::YesNo(true)).unwrap();
    session.submit(&Answer::Number(2.0)).unwrap();
    assert!(session.is_finished());

    c.bench_function("session/finish_and_filter", |b| {
        b.iter(|| session.clone().finish());
    });
}

criterion_group!(benches, bench_full_session, bench_filter_only);
criterion_main!(benches);
