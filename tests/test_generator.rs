use pso_workflow_scheduler::api::workflow_dto::WorkflowDto;
use pso_workflow_scheduler::domain::evaluator::SimulationConfig;
use pso_workflow_scheduler::domain::workflow::generator::{GeneratorConfig, WorkflowGenerator};
use pso_workflow_scheduler::domain::workflow::workflow::Workflow;
use pso_workflow_scheduler::{load_workflow, save_workflow};

fn generator(seed: u64) -> WorkflowGenerator {
    WorkflowGenerator::new(GeneratorConfig { seed: Some(seed), ..Default::default() }, SimulationConfig::default())
}

#[test]
fn test_edge_count_bounds_hold_for_many_sizes() {
    let mut generator = generator(100);
    for n in [2, 3, 10, 50] {
        let workflow = generator.generate(n).unwrap();
        assert!(workflow.edge_count() >= n / 2, "{} edges for {} tasks", workflow.edge_count(), n);
        assert!(workflow.edge_count() <= n * (n - 1) / 2);
        assert_eq!(workflow.topological_order().len(), n);
    }
}

#[test]
fn test_generated_workflow_survives_json() {
    let workflow = generator(8).generate(20).unwrap();

    let path = std::env::temp_dir().join(format!("pso_workflow_scheduler_{}.json", std::process::id()));
    let path = path.to_string_lossy().to_string();
    save_workflow(&path, &workflow).unwrap();
    let reloaded = load_workflow(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(reloaded.tasks(), workflow.tasks());
    assert_eq!(WorkflowDto::from(&reloaded), WorkflowDto::from(&workflow));
}

#[test]
fn test_hand_written_json_is_accepted() {
    let json = r#"{ "tasks": [
        { "id": 0, "length": 8000.0, "deadline": 4.0 },
        { "id": 1, "length": 8010.0, "deadline": 9.0, "parents": [0] }
    ] }"#;
    let dto: WorkflowDto = serde_json::from_str(json).unwrap();
    let workflow = Workflow::try_from(dto).unwrap();

    assert_eq!(workflow.len(), 2);
    assert_eq!(workflow.edge_count(), 1);
}
