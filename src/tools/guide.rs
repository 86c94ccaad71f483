//! Plan authoring guide served as a resource to the planning agent

pub const GUIDE_URI: &str = "file://coach_plan_guide";

pub const PLAN_GUIDE: &str = r#"# Coach Workout Plan Guide

## Workflow
1. `list_scheduled_dates` - see which days already have a plan
2. `get_workout_plan` - read existing plans before writing new ones
3. `set_block_plan` (block format) or `set_workout_plan` (flat format) - write a plan
4. `add_exercise`, `remove_exercise`, `update_exercise`, `update_plan_metadata` - adjust one plan
5. `get_workout_logs` / `get_workout_summary` - review what was actually done

## Flat plan format

```json
{
  "day_name": "Lower Body + Bike",
  "location": "Home",
  "phase": "Foundation",
  "exercises": [
    {"id": "warmup_1", "name": "Stability Start", "type": "checklist",
     "items": ["Cat-Cow x10", "Bird-Dog x5/side"]},
    {"id": "ex_1", "name": "KB Goblet Squat", "type": "strength",
     "target_sets": 3, "target_reps": "10", "guidance_note": "Tempo 3-1-1"},
    {"id": "cardio_1", "name": "Zone 2 Bike", "type": "duration",
     "target_duration_min": 15, "guidance_note": "HR 135-148"}
  ]
}
```

Every exercise needs an `id` unique within the plan, a `name` and a `type`.

## Exercise types
- `strength`: sets x reps (`target_sets`, `target_reps`)
- `circuit`: strength work done in rounds
- `duration`: steady cardio (`target_duration_min`)
- `interval`: hard/easy repeats (`rounds`, `work_duration_sec`, `rest_duration_sec`)
- `checklist`: warmups and routines (`items`)
- `weighted_time`: loaded holds and carries (`target_duration_sec`)

Optional display hints: `hide_weight: true` for bodyweight or band work,
`show_time: true` when reps are a duration such as "30 sec".

## Block plan format

```json
{
  "theme": "Lower Body + Bike", "location": "Home", "phase": "Foundation",
  "total_duration_min": 60,
  "blocks": [
    {"block_type": "warmup", "title": "Stability Start",
     "exercises": [{"name": "Cat-Cow", "reps": 10}]},
    {"block_type": "strength", "rest_guidance": "Rest 2-3 min",
     "exercises": [{"name": "Squat", "sets": 3, "reps": 5, "tempo": "3-1-1"}]},
    {"block_type": "circuit", "rounds": 4,
     "exercises": [{"name": "KB Swings", "reps": 15, "equipment": "kettlebell"}]},
    {"block_type": "cardio", "duration_min": 15,
     "instructions": ["Zone 2 at 140 bpm"]}
  ]
}
```

Block types: warmup, strength, accessory, circuit, power, cardio. Ids are
generated from the block type and position. Rest guidance is attached to
strength exercises only. Instruction blocks mentioning VO2 or HARD become
intervals.
"#;
