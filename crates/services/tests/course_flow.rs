//! End-to-end walk through the shipped course: enrollment, graded modules,
//! capstone finalization, and the certificate gate.

use pcteacher_core::engine::EngineError;
use pcteacher_core::model::LearnerId;
use pcteacher_core::time::fixed_clock;
use services::error::{CertificateError, ProgressError};
use services::CourseServices;

/// An answer the stand-in keyword grader accepts, per graded module.
fn correct_answer(slug: &str) -> &'static str {
    match slug {
        "introducao" => "resolver um problema com o computador",
        "decomposicao" => "dividir o problema em partes menores",
        "rec-padrao" => "procurar um padrão que se repete",
        "abstracao" => "focar no essencial e ignorar detalhes",
        "algoritmo" => "descrever um algoritmo passo a passo",
        other => panic!("no graded answer for {other}"),
    }
}

#[tokio::test]
async fn full_course_run_ends_with_a_certificate() {
    let services = CourseServices::in_memory(fixed_clock());
    let learner = LearnerId::new(1);
    services.enrollment().enroll(learner).await.unwrap();

    let overview = services.progress().overview(learner).await.unwrap();
    assert_eq!(overview.overall_percent, 0);
    assert!(overview.modules[0].is_unlocked);
    assert!(!overview.modules[1].is_unlocked);

    for slug in [
        "introducao",
        "decomposicao",
        "rec-padrao",
        "abstracao",
        "algoritmo",
    ] {
        // one wrong answer first; it must not block completion
        let wrong = services
            .progress()
            .submit_exercise(learner, slug, "não faço ideia")
            .await
            .unwrap();
        assert!(!wrong.is_correct);
        assert!(!wrong.is_now_completed);

        let mut completed = false;
        for _ in 0..3 {
            let outcome = services
                .progress()
                .submit_exercise(learner, slug, correct_answer(slug))
                .await
                .unwrap();
            assert!(outcome.is_correct);
            completed = outcome.is_now_completed;
        }
        assert!(completed, "{slug} should complete on the third correct");
    }

    // graded modules done, capstone still open
    let overview = services.progress().overview(learner).await.unwrap();
    assert_eq!(overview.completed_modules, 5);
    assert_eq!(overview.overall_percent, 83);

    let err = services
        .certificates()
        .issue(learner)
        .await
        .unwrap_err();
    assert!(matches!(err, CertificateError::NotEligible { percent: 83 }));

    services
        .progress()
        .finalize_module(learner, "projeto-final")
        .await
        .unwrap();

    let eligibility = services.certificates().eligibility(learner).await.unwrap();
    assert!(eligibility.eligible);
    assert_eq!(eligibility.overall_percent, 100);
    services.certificates().issue(learner).await.unwrap();
}

#[tokio::test]
async fn locked_content_is_rejected_even_when_routes_are_bypassed() {
    let services = CourseServices::in_memory(fixed_clock());
    let learner = LearnerId::new(2);
    services.enrollment().enroll(learner).await.unwrap();

    assert!(
        !services
            .progress()
            .is_unlocked(learner, "decomposicao")
            .await
            .unwrap()
    );

    let err = services
        .progress()
        .submit_exercise(learner, "decomposicao", "dividir em partes")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Engine(EngineError::ModuleLocked { .. })
    ));

    let err = services
        .progress()
        .finalize_module(learner, "projeto-final")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Engine(EngineError::DependencyNotMet { .. })
    ));
}

#[tokio::test]
async fn resubmission_after_completion_never_double_counts() {
    let services = CourseServices::in_memory(fixed_clock());
    let learner = LearnerId::new(3);
    services.enrollment().enroll(learner).await.unwrap();

    for _ in 0..3 {
        services
            .progress()
            .submit_exercise(learner, "introducao", correct_answer("introducao"))
            .await
            .unwrap();
    }

    let replay = services
        .progress()
        .submit_exercise(learner, "introducao", correct_answer("introducao"))
        .await
        .unwrap();
    assert!(replay.already_completed);
    assert_eq!(replay.correct_count, 3);

    let overview = services.progress().overview(learner).await.unwrap();
    assert_eq!(overview.total_correct, 3);
    assert_eq!(overview.completed_modules, 1);
}
