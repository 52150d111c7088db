//! Two-section workflow document rendering.
//!
//! The target schema describes one workflow twice: a `graf` section with
//! the full port topology and a `real` section with execution properties.
//! Both sections walk the same emitted job set. The graf section lists
//! every port; the real section drops user-provided inputs and outputs
//! without a destination and renumbers the survivors.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::{ExportError, ExportResult};
use crate::model::{ConnectionType, Input, Job, Output, PortRef, Workflow};
use crate::profile::ExecutionTarget;
use crate::serialize::NameTable;

/// Renders the complete two-section workflow document.
///
/// `title` becomes the workflow name, with the section names derived from
/// it. Jobs flagged as ignored are skipped entirely.
pub fn render_document(
    workflow: &Workflow,
    names: &NameTable,
    target: &ExecutionTarget,
    title: &str,
) -> ExportResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let graf_name = format!("{title}_graf");
    let real_name = format!("{title}_real");

    let mut root = BytesStart::new("workflow");
    root.push_attribute(("download", "all"));
    root.push_attribute(("export", "proj"));
    root.push_attribute(("mainabst", ""));
    root.push_attribute(("maingraf", graf_name.as_str()));
    root.push_attribute(("mainreal", real_name.as_str()));
    root.push_attribute(("name", title));
    writer.write_event(Event::Start(root))?;

    write_graf_section(&mut writer, workflow, names, &graf_name)?;
    write_real_section(&mut writer, workflow, names, target, &real_name)?;

    writer.write_event(Event::End(BytesEnd::new("workflow")))?;
    Ok(writer.into_inner())
}

fn write_graf_section(
    writer: &mut Writer<Vec<u8>>,
    workflow: &Workflow,
    names: &NameTable,
    name: &str,
) -> ExportResult<()> {
    let mut section = BytesStart::new("graf");
    section.push_attribute(("name", name));
    section.push_attribute(("text", ""));
    writer.write_event(Event::Start(section))?;

    for job in workflow.jobs().filter(|job| !job.ignored) {
        write_graf_job(writer, names, job)?;
    }

    writer.write_event(Event::End(BytesEnd::new("graf")))?;
    Ok(())
}

fn write_graf_job(
    writer: &mut Writer<Vec<u8>>,
    names: &NameTable,
    job: &Job,
) -> ExportResult<()> {
    writer.write_event(Event::Start(job_element(names, job)?))?;

    let input_count = job.inputs().len() as u32;
    for input in job.inputs() {
        let (prejob, preoutput) = back_reference(names, input, input_count)?;
        let element = input_element(input, &prejob, &preoutput, input.port_nr);
        writer.write_event(Event::Empty(element))?;
    }
    for output in job.outputs() {
        let element = output_element(output, input_count + output.port_nr);
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("job")))?;
    Ok(())
}

fn write_real_section(
    writer: &mut Writer<Vec<u8>>,
    workflow: &Workflow,
    names: &NameTable,
    target: &ExecutionTarget,
    name: &str,
) -> ExportResult<()> {
    let mut section = BytesStart::new("real");
    section.push_attribute(("name", name));
    section.push_attribute(("text", ""));
    writer.write_event(Event::Start(section))?;

    for job in workflow.jobs().filter(|job| !job.ignored) {
        write_real_job(writer, workflow, names, target, job)?;
    }

    writer.write_event(Event::End(BytesEnd::new("real")))?;
    Ok(())
}

fn write_real_job(
    writer: &mut Writer<Vec<u8>>,
    workflow: &Workflow,
    names: &NameTable,
    target: &ExecutionTarget,
    job: &Job,
) -> ExportResult<()> {
    writer.write_event(Event::Start(job_element(names, job)?))?;

    let survivors: Vec<&Input> = job
        .inputs()
        .iter()
        .filter(|input| input.connection != ConnectionType::UserProvided)
        .collect();
    let input_count = survivors.len() as u32;

    for (seq, input) in survivors.iter().enumerate() {
        let (prejob, preoutput) = back_reference(names, input, input_count)?;
        writer.write_event(Event::Start(input_element(input, &prejob, &preoutput, seq as u32)))?;

        let eparam = if input.source.is_some_and(|source| generator_fed(workflow, source)) {
            "1"
        } else {
            "0"
        };
        let waiting = if input.connection == ConnectionType::Collector {
            "all"
        } else {
            "one"
        };
        write_entry(writer, "port_prop", "eparam", eparam)?;
        write_entry(writer, "port_prop", "waitingtmp", waiting)?;
        write_entry(writer, "port_prop", "waiting", waiting)?;
        write_entry(writer, "port_prop", "intname", &input.name)?;
        write_entry(writer, "port_prop", "dpid", "0")?;
        write_entry(writer, "port_prop", "pequaltype", "0")?;

        writer.write_event(Event::End(BytesEnd::new("input")))?;
    }

    let emitted_outputs = job
        .outputs()
        .iter()
        .filter(|output| !output.destinations.is_empty());
    for (offset, output) in emitted_outputs.enumerate() {
        writer.write_event(Event::Start(output_element(output, input_count + offset as u32)))?;

        let maincount = if output.connection == ConnectionType::Generator {
            "*"
        } else {
            "1"
        };
        write_entry(writer, "port_prop", "maincount0", "1")?;
        write_entry(writer, "port_prop", "intname", &output.name)?;
        write_entry(writer, "port_prop", "type0", "permanent")?;
        write_entry(writer, "port_prop", "maincount", maincount)?;

        writer.write_event(Event::End(BytesEnd::new("output")))?;
    }

    write_entry(writer, "execute", "type", "binary")?;
    write_entry(writer, "execute", "params", &execute_params(job, target))?;
    write_entry(writer, "execute", "jobistype", "binary")?;
    write_entry(writer, "execute", "jobmanager", &target.job_manager)?;
    write_entry(writer, "execute", "gridtype", &target.grid_type)?;
    write_entry(writer, "execute", "resource", &target.resource)?;
    write_entry(writer, "execute", "grid", &target.grid)?;

    for (key, value) in &job.parameters {
        let mut entry = BytesStart::new("description");
        entry.push_attribute(("key", key.as_str()));
        entry.push_attribute(("value", value.as_str()));
        writer.write_event(Event::Empty(entry))?;
    }

    writer.write_event(Event::End(BytesEnd::new("job")))?;
    Ok(())
}

fn job_element(names: &NameTable, job: &Job) -> ExportResult<BytesStart<'static>> {
    let name = names.get(job.id).ok_or_else(|| {
        ExportError::GraphIntegrity(format!("job {} has no export name", job.id))
    })?;
    let mut element = BytesStart::new("job");
    element.push_attribute(("name", name));
    element.push_attribute(("text", job.description.as_str()));
    element.push_attribute(("x", job.position.x.to_string().as_str()));
    element.push_attribute(("y", job.position.y.to_string().as_str()));
    Ok(element)
}

fn input_element(input: &Input, prejob: &str, preoutput: &str, seq: u32) -> BytesStart<'static> {
    let mut element = BytesStart::new("input");
    element.push_attribute(("name", input.name.as_str()));
    element.push_attribute(("prejob", prejob));
    element.push_attribute(("preoutput", preoutput));
    element.push_attribute(("seq", seq.to_string().as_str()));
    element.push_attribute(("text", ""));
    element.push_attribute(("x", input.position.x.to_string().as_str()));
    element.push_attribute(("y", input.position.y.to_string().as_str()));
    element
}

fn output_element(output: &Output, seq: u32) -> BytesStart<'static> {
    let mut element = BytesStart::new("output");
    element.push_attribute(("name", output.name.as_str()));
    element.push_attribute(("seq", seq.to_string().as_str()));
    element.push_attribute(("text", ""));
    element.push_attribute(("x", output.position.x.to_string().as_str()));
    element.push_attribute(("y", output.position.y.to_string().as_str()));
    element
}

/// Resolves the `prejob`/`preoutput` back-reference pair for an input.
///
/// Output back-references are offset by the consumer's own input count,
/// a numbering the target schema expects.
fn back_reference(
    names: &NameTable,
    input: &Input,
    input_count: u32,
) -> ExportResult<(String, String)> {
    match input.connection {
        ConnectionType::UserProvided => Ok((String::new(), String::new())),
        ConnectionType::NotAssigned => Err(ExportError::GraphIntegrity(format!(
            "input {} was never resolved",
            input.name
        ))),
        _ => {
            let source = input.source.ok_or_else(|| {
                ExportError::GraphIntegrity(format!("input {} has no source channel", input.name))
            })?;
            let prejob = names.get(source.job).ok_or_else(|| {
                ExportError::GraphIntegrity(format!(
                    "input {} references job {} which is not emitted",
                    input.name, source.job
                ))
            })?;
            Ok((
                prejob.to_owned(),
                (source.port_nr + input_count).to_string(),
            ))
        }
    }
}

fn generator_fed(workflow: &Workflow, source: PortRef) -> bool {
    workflow
        .job(source.job)
        .and_then(|job| job.output(source.port_nr))
        .is_some_and(|output| output.connection == ConnectionType::Generator)
}

fn execute_params(job: &Job, target: &ExecutionTarget) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(executable) = &job.executable {
        let name = executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| executable.display().to_string());
        parts.push(name);
    }
    parts.extend(job.command_line.iter().cloned());
    if !target.params.is_empty() {
        parts.push(target.params.clone());
    }
    parts.join(" ")
}

fn write_entry(
    writer: &mut Writer<Vec<u8>>,
    element: &str,
    key: &str,
    value: &str,
) -> ExportResult<()> {
    let mut entry = BytesStart::new(element.to_owned());
    entry.push_attribute(("key", key));
    entry.push_attribute(("value", value));
    writer.write_event(Event::Empty(entry))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::{JobKind, Port};
    use crate::session::{NodeId, Position};

    fn sample_target() -> ExecutionTarget {
        ExecutionTarget {
            grid: "local".into(),
            grid_type: "pbs".into(),
            resource: "cluster".into(),
            job_manager: "batch".into(),
            params: String::new(),
        }
    }

    fn canonical_workflow() -> Workflow {
        let mut mixer = Job::new(NodeId::new(1), "Mixer", JobKind::CommandLine);
        mixer.position = Position::new(10, 20);
        mixer.executable = Some("mixer".into());
        mixer.command_line = vec!["-m".into()];
        mixer.push_input(
            Port::new("words", "txt", 0)
                .with_connection(ConnectionType::UserProvided)
                .into(),
        );
        mixer.push_input(
            Port::new("numbers", "txt", 1)
                .with_connection(ConnectionType::UserProvided)
                .into(),
        );
        let mut combined: Output = Port::new("combined", "txt", 0)
            .with_connection(ConnectionType::Channel)
            .into();
        combined.destinations.push(PortRef::new(NodeId::new(2), 0));
        mixer.push_output(combined);

        let mut modifier = Job::new(NodeId::new(2), "Modifier", JobKind::CommandLine);
        modifier.executable = Some("modifier".into());
        let mut wordsnumbers: Input = Port::new("wordsnumbers", "txt", 0)
            .with_connection(ConnectionType::Channel)
            .into();
        wordsnumbers.source = Some(PortRef::new(NodeId::new(1), 0));
        modifier.push_input(wordsnumbers);
        modifier.push_output(Port::new("finalresult", "txt", 0).into());

        let mut workflow = Workflow::new();
        workflow.insert(mixer).unwrap();
        workflow.insert(modifier).unwrap();
        workflow
    }

    fn render(workflow: &Workflow) -> String {
        let names = NameTable::assign(workflow);
        let bytes = render_document(workflow, &names, &sample_target(), "sample").unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_graf_section_matches_documented_format() {
        let xml = render(&canonical_workflow());

        assert!(xml.contains(
            r#"<workflow download="all" export="proj" mainabst="" maingraf="sample_graf" mainreal="sample_real" name="sample">"#
        ));
        assert!(xml.contains(r#"<graf name="sample_graf" text="">"#));
        assert!(xml.contains(r#"<input name="words" prejob="" preoutput="" seq="0""#));
        assert!(xml.contains(r#"<input name="numbers" prejob="" preoutput="" seq="1""#));
        assert!(xml.contains(r#"<output name="combined" seq="2""#));
        assert!(xml.contains(r#"<input name="wordsnumbers" prejob="Mixer" preoutput="1" seq="0""#));
        assert!(xml.contains(r#"<output name="finalresult" seq="1""#));
    }

    #[test]
    fn test_real_section_drops_excluded_ports() {
        let xml = render(&canonical_workflow());

        // User-provided inputs appear in the graf section only.
        assert_eq!(xml.matches(r#"name="words""#).count(), 1);
        assert_eq!(xml.matches(r#"name="numbers""#).count(), 1);
        // The unconnected output likewise.
        assert_eq!(xml.matches("finalresult").count(), 1);
        // Surviving ports are renumbered from zero per section.
        assert!(xml.contains(r#"<output name="combined" seq="0""#));
    }

    #[test]
    fn test_real_section_port_properties() {
        let xml = render(&canonical_workflow());

        assert!(xml.contains(r#"<port_prop key="eparam" value="0""#));
        assert!(xml.contains(r#"<port_prop key="waitingtmp" value="one""#));
        assert!(xml.contains(r#"<port_prop key="waiting" value="one""#));
        assert!(xml.contains(r#"<port_prop key="intname" value="wordsnumbers""#));
        assert!(xml.contains(r#"<port_prop key="dpid" value="0""#));
        assert!(xml.contains(r#"<port_prop key="pequaltype" value="0""#));
        assert!(xml.contains(r#"<port_prop key="maincount0" value="1""#));
        assert!(xml.contains(r#"<port_prop key="type0" value="permanent""#));
        assert!(xml.contains(r#"<port_prop key="maincount" value="1""#));
    }

    #[test]
    fn test_execute_entries_carry_target_and_command_line() {
        let xml = render(&canonical_workflow());

        assert!(xml.contains(r#"<execute key="type" value="binary""#));
        assert!(xml.contains(r#"<execute key="params" value="mixer -m""#));
        assert!(xml.contains(r#"<execute key="jobistype" value="binary""#));
        assert!(xml.contains(r#"<execute key="jobmanager" value="batch""#));
        assert!(xml.contains(r#"<execute key="gridtype" value="pbs""#));
        assert!(xml.contains(r#"<execute key="resource" value="cluster""#));
        assert!(xml.contains(r#"<execute key="grid" value="local""#));
    }

    #[test]
    fn test_parameters_become_description_entries() {
        let mut workflow = canonical_workflow();
        let job = workflow.job_mut(NodeId::new(2)).unwrap();
        job.parameters.insert("memory".into(), "2048".into());
        job.parameters.insert("cores".into(), "4".into());

        let xml = render(&workflow);
        assert!(xml.contains(r#"<description key="cores" value="4""#));
        assert!(xml.contains(r#"<description key="memory" value="2048""#));
    }

    #[test]
    fn test_loop_markers_render_as_port_properties() {
        let mut producer = Job::new(NodeId::new(1), "Splitter", JobKind::CommandLine);
        producer.executable = Some("split".into());
        let mut parts: Output = Port::new("parts", "txt", 0)
            .with_connection(ConnectionType::Generator)
            .into();
        parts.destinations.push(PortRef::new(NodeId::new(2), 0));
        producer.push_output(parts);

        let mut consumer = Job::new(NodeId::new(2), "Merger", JobKind::CommandLine);
        consumer.executable = Some("merge".into());
        let mut all: Input = Port::new("all", "txt", 0)
            .with_connection(ConnectionType::Collector)
            .into();
        all.source = Some(PortRef::new(NodeId::new(1), 0));
        consumer.push_input(all);

        let mut workflow = Workflow::new();
        workflow.insert(producer).unwrap();
        workflow.insert(consumer).unwrap();

        let xml = render(&workflow);
        assert!(xml.contains(r#"<port_prop key="maincount" value="*""#));
        assert!(xml.contains(r#"<port_prop key="waiting" value="all""#));
        assert!(xml.contains(r#"<port_prop key="waitingtmp" value="all""#));
        assert!(xml.contains(r#"<port_prop key="eparam" value="1""#));
    }

    #[test]
    fn test_ignored_jobs_are_skipped() {
        let mut workflow = canonical_workflow();
        let mut marker = Job::new(NodeId::new(3), "Spread", JobKind::Generator);
        marker.ignored = true;
        workflow.insert(marker).unwrap();

        let xml = render(&workflow);
        assert!(!xml.contains("Spread"));
    }

    #[test]
    fn test_unresolved_input_is_rejected() {
        let mut workflow = canonical_workflow();
        let job = workflow.job_mut(NodeId::new(2)).unwrap();
        job.push_input(Port::new("dangling", "txt", 1).into());

        let names = NameTable::assign(&workflow);
        assert!(matches!(
            render_document(&workflow, &names, &sample_target(), "sample"),
            Err(ExportError::GraphIntegrity(_))
        ));
    }

    #[test]
    fn test_prejob_references_close_over_the_document() {
        let xml = render(&canonical_workflow());

        let mut section = String::new();
        let mut jobs: HashMap<String, Vec<String>> = HashMap::new();
        let mut references: Vec<(String, String)> = Vec::new();

        let mut reader = quick_xml::Reader::from_str(&xml);
        loop {
            let event = reader.read_event().unwrap();
            let element = match &event {
                Event::Eof => break,
                Event::Start(element) | Event::Empty(element) => element,
                _ => continue,
            };
            match element.name().as_ref() {
                b"graf" => section = "graf".to_owned(),
                b"real" => section = "real".to_owned(),
                b"job" => {
                    let name = element.try_get_attribute("name").unwrap().unwrap();
                    jobs.entry(section.clone())
                        .or_default()
                        .push(name.unescape_value().unwrap().into_owned());
                }
                b"input" => {
                    let prejob = element.try_get_attribute("prejob").unwrap().unwrap();
                    let prejob = prejob.unescape_value().unwrap().into_owned();
                    if !prejob.is_empty() {
                        references.push((section.clone(), prejob));
                    }
                }
                _ => {}
            }
        }

        for (section, prejob) in &references {
            assert!(jobs[section].contains(prejob), "{prejob} missing from {section}");
        }
        for names in jobs.values() {
            let mut unique = names.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), names.len());
        }
        assert_eq!(jobs["graf"], jobs["real"]);
    }
}
